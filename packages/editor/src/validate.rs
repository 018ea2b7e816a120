//! Submit-time validation of the quiz tree

use crate::ledger::PositionKey;
use quizforge_model::{Question, QuestionKind, Quiz};
use serde::{Deserialize, Serialize};

/// The structural rule a question (or the quiz) violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationRule {
    EmptyQuizName,
    EmptyPrompt,
    NoOptions,
    NoSelection,
    MultipleSelections,
    MissingTextAnswer,
    MissingCodeLanguage,
}

/// One validation failure, addressed to the offending node so the caller
/// can highlight it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Position of the offending question; `None` for quiz-level issues
    pub position: Option<PositionKey>,

    pub rule: ValidationRule,

    pub message: String,
}

impl ValidationIssue {
    fn quiz(rule: ValidationRule, message: impl Into<String>) -> Self {
        Self {
            position: None,
            rule,
            message: message.into(),
        }
    }

    fn question(position: PositionKey, rule: ValidationRule, message: impl Into<String>) -> Self {
        Self {
            position: Some(position),
            rule,
            message: message.into(),
        }
    }
}

/// Check the whole tree's structural invariants, independent of transport.
///
/// Issues are reported per question, never rolled up into one message.
pub fn validate_quiz(quiz: &Quiz) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if quiz.name.trim().is_empty() {
        issues.push(ValidationIssue::quiz(
            ValidationRule::EmptyQuizName,
            "quiz name is empty",
        ));
    }

    for (section_index, section) in quiz.sections.iter().enumerate() {
        for (question_index, question) in section.questions.iter().enumerate() {
            let position = PositionKey::new(section_index, question_index);
            validate_question(position, question, &mut issues);
        }
    }

    issues
}

fn validate_question(position: PositionKey, question: &Question, issues: &mut Vec<ValidationIssue>) {
    if question.prompt.trim().is_empty() {
        issues.push(ValidationIssue::question(
            position,
            ValidationRule::EmptyPrompt,
            "question prompt is empty",
        ));
    }

    if question.kind.uses_options() {
        if question.options.is_empty() {
            issues.push(ValidationIssue::question(
                position,
                ValidationRule::NoOptions,
                "question has no options",
            ));
        } else if question.selected_count() == 0 {
            issues.push(ValidationIssue::question(
                position,
                ValidationRule::NoSelection,
                "no option selected",
            ));
        }

        // Mutations already enforce exclusivity; a deserialized tree can
        // still arrive with more than one selection.
        if question.kind == QuestionKind::SingleChoice && question.selected_count() > 1 {
            issues.push(ValidationIssue::question(
                position,
                ValidationRule::MultipleSelections,
                "single choice question has more than one selected option",
            ));
        }
    }

    if question.kind.requires_text_answer() {
        let missing = question
            .text_answer
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);
        if missing {
            issues.push(ValidationIssue::question(
                position,
                ValidationRule::MissingTextAnswer,
                "text answer is required",
            ));
        }
    }

    if question.kind == QuestionKind::Code {
        let missing = question
            .code_language
            .as_deref()
            .map(|l| l.trim().is_empty())
            .unwrap_or(true);
        if missing {
            issues.push(ValidationIssue::question(
                position,
                ValidationRule::MissingCodeLanguage,
                "code language is required",
            ));
        }
    }
}
