use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned quiz identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(pub u64);

/// Server-assigned section identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u64);

/// Server-assigned question identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator selecting a question's editing and validation sub-mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Radio semantics: at most one selected option
    SingleChoice,

    /// Checkbox semantics: any subset of options
    MultiChoice,

    /// Checkbox semantics plus a required free-text answer
    SingleChoiceWithText,

    /// Free-text answer only, no options
    TextAnswer,

    /// Code answer, requires a language
    Code,
}

impl QuestionKind {
    /// Whether questions of this kind are answered through options
    pub fn uses_options(self) -> bool {
        matches!(
            self,
            QuestionKind::SingleChoice
                | QuestionKind::MultiChoice
                | QuestionKind::SingleChoiceWithText
        )
    }

    /// Whether questions of this kind require a non-empty text answer
    pub fn requires_text_answer(self) -> bool {
        matches!(
            self,
            QuestionKind::SingleChoiceWithText | QuestionKind::TextAnswer
        )
    }
}

/// One selectable answer belonging to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,

    #[serde(default)]
    pub selected: bool,
}

impl AnswerOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selected: false,
        }
    }
}

/// Question node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Server-assigned; absent before first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,

    /// 0-based position within the owning section
    pub order: usize,

    pub prompt: String,

    pub kind: QuestionKind,

    #[serde(default)]
    pub options: Vec<AnswerOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_language: Option<String>,

    /// Server-side path of the uploaded image, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl Question {
    /// New question at `order`, defaulting to single choice
    pub fn new(order: usize) -> Self {
        Self {
            id: None,
            order,
            prompt: String::new(),
            kind: QuestionKind::SingleChoice,
            options: Vec::new(),
            text_answer: None,
            code_language: None,
            image_path: None,
        }
    }

    /// Number of options currently selected
    pub fn selected_count(&self) -> usize {
        self.options.iter().filter(|o| o.selected).count()
    }

    /// Clear every option's selected flag
    pub fn clear_selections(&mut self) {
        for option in &mut self.options {
            option.selected = false;
        }
    }
}

/// Section node: an ordered list of questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Server-assigned; absent before first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SectionId>,

    pub name: String,

    /// 0-based position within the quiz
    pub order: usize,

    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Section {
    pub fn new(name: impl Into<String>, order: usize) -> Self {
        Self {
            id: None,
            name: name.into(),
            order,
            questions: Vec::new(),
        }
    }

    /// Restore `order = index` for every question after a removal
    pub fn renumber_questions(&mut self) {
        for (index, question) in self.questions.iter_mut().enumerate() {
            question.order = index;
        }
    }
}

/// Root of the authored quiz tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Server-assigned; absent before first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuizId>,

    /// Server-assigned short code; absent before first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub name: String,

    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Quiz {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            code: None,
            name: name.into(),
            domain: String::new(),
            category: String::new(),
            level: None,
            tags: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Question at `(section, question)`, if the position exists
    pub fn question(&self, section: usize, question: usize) -> Option<&Question> {
        self.sections.get(section)?.questions.get(question)
    }

    pub fn question_mut(&mut self, section: usize, question: usize) -> Option<&mut Question> {
        self.sections.get_mut(section)?.questions.get_mut(question)
    }

    /// Question count per section, in section order
    pub fn shape(&self) -> Vec<usize> {
        self.sections.iter().map(|s| s.questions.len()).collect()
    }

    /// Same section count and same question count per section, in order
    pub fn same_shape(&self, other: &Quiz) -> bool {
        self.shape() == other.shape()
    }

    /// Restore `order = index` for every section after a removal
    pub fn renumber_sections(&mut self) {
        for (index, section) in self.sections.iter_mut().enumerate() {
            section.order = index;
        }
    }
}
