//! # Tree Mutations
//!
//! High-level semantic operations on the quiz tree.
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: Each mutation represents one authoring gesture
//! 2. **Infallible on valid positions**: Only out-of-range indices fail;
//!    semantic invalidity (e.g. a question with no selected option) is left
//!    for submit-time validation
//! 3. **Ledger-consistent**: Removals re-key the attachment ledger in the
//!    same step, so ledger keys always address live tree positions
//!
//! ## Mutation Semantics
//!
//! ### AddSection / AddQuestion / AddOption
//! - Always append; `order` is the new element's index
//!
//! ### RemoveSection / RemoveQuestion
//! - Later siblings' `order` shifts down by one (contiguous from 0)
//! - Ledger entries at the removed position are dropped, later keys shift
//!
//! ### SetKind
//! - Clears every option's selected flag (destructive, immediate)
//! - Does not touch `options`, `text_answer` or `code_language`
//!
//! ### SetOptionSelected
//! - Radio semantics under `SingleChoice`: selecting one option forces all
//!   siblings to false
//! - Checkbox semantics otherwise
//! - Removing a selected option under `SingleChoice` leaves the question
//!   with no selection; validation reports it at submit

use crate::ledger::AttachmentLedger;
use quizforge_model::{AnswerOption, Question, QuestionKind, Quiz, Section};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic mutations (one per authoring gesture)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Rename the quiz
    SetQuizName { name: String },

    /// Set the quiz's business domain
    SetQuizDomain { domain: String },

    /// Set the quiz's category
    SetQuizCategory { category: String },

    /// Set or clear the quiz's difficulty level
    SetQuizLevel { level: Option<String> },

    /// Replace the quiz's tag list
    SetQuizTags { tags: Vec<String> },

    /// Append a section at the end of the quiz
    AddSection { name: String },

    /// Remove the section at `section`
    RemoveSection { section: usize },

    /// Rename a section
    SetSectionName { section: usize, name: String },

    /// Append a question (single choice by default) to a section
    AddQuestion { section: usize },

    /// Remove the question at `(section, question)`
    RemoveQuestion { section: usize, question: usize },

    /// Replace a question's prompt
    SetPrompt {
        section: usize,
        question: usize,
        prompt: String,
    },

    /// Switch a question's kind, clearing every option selection
    SetKind {
        section: usize,
        question: usize,
        kind: QuestionKind,
    },

    /// Set or clear a question's free-text answer
    SetTextAnswer {
        section: usize,
        question: usize,
        text: Option<String>,
    },

    /// Set or clear a question's code language
    SetCodeLanguage {
        section: usize,
        question: usize,
        language: Option<String>,
    },

    /// Append an option to a question
    AddOption {
        section: usize,
        question: usize,
        text: String,
    },

    /// Remove the option at `option`
    RemoveOption {
        section: usize,
        question: usize,
        option: usize,
    },

    /// Replace an option's text
    SetOptionText {
        section: usize,
        question: usize,
        option: usize,
        text: String,
    },

    /// Select or deselect an option, applying the question kind's
    /// exclusivity rule
    SetOptionSelected {
        section: usize,
        question: usize,
        option: usize,
        selected: bool,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("no section at index {0}")]
    SectionOutOfRange(usize),

    #[error("no question at index {1} in section {0}")]
    QuestionOutOfRange(usize, usize),

    #[error("no option at index {2} in question ({0}, {1})")]
    OptionOutOfRange(usize, usize, usize),
}

impl Mutation {
    /// Apply the mutation to the tree, keeping the ledger's keys aligned
    /// with the tree's renumbering
    pub fn apply(
        &self,
        quiz: &mut Quiz,
        ledger: &mut AttachmentLedger,
    ) -> Result<(), MutationError> {
        match self {
            Mutation::SetQuizName { name } => {
                quiz.name = name.clone();
                Ok(())
            }

            Mutation::SetQuizDomain { domain } => {
                quiz.domain = domain.clone();
                Ok(())
            }

            Mutation::SetQuizCategory { category } => {
                quiz.category = category.clone();
                Ok(())
            }

            Mutation::SetQuizLevel { level } => {
                quiz.level = level.clone();
                Ok(())
            }

            Mutation::SetQuizTags { tags } => {
                quiz.tags = tags.clone();
                Ok(())
            }

            Mutation::AddSection { name } => {
                let order = quiz.sections.len();
                quiz.sections.push(Section::new(name.clone(), order));
                Ok(())
            }

            Mutation::RemoveSection { section } => {
                if *section >= quiz.sections.len() {
                    return Err(MutationError::SectionOutOfRange(*section));
                }
                quiz.sections.remove(*section);
                quiz.renumber_sections();
                ledger.reindex_after_section_removal(*section);
                Ok(())
            }

            Mutation::SetSectionName { section, name } => {
                let target = section_mut(quiz, *section)?;
                target.name = name.clone();
                Ok(())
            }

            Mutation::AddQuestion { section } => {
                let target = section_mut(quiz, *section)?;
                let order = target.questions.len();
                target.questions.push(Question::new(order));
                Ok(())
            }

            Mutation::RemoveQuestion { section, question } => {
                let target = section_mut(quiz, *section)?;
                if *question >= target.questions.len() {
                    return Err(MutationError::QuestionOutOfRange(*section, *question));
                }
                target.questions.remove(*question);
                target.renumber_questions();
                ledger.reindex_after_question_removal(*section, *question);
                Ok(())
            }

            Mutation::SetPrompt {
                section,
                question,
                prompt,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                target.prompt = prompt.clone();
                Ok(())
            }

            Mutation::SetKind {
                section,
                question,
                kind,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                target.kind = *kind;
                target.clear_selections();
                Ok(())
            }

            Mutation::SetTextAnswer {
                section,
                question,
                text,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                target.text_answer = text.clone();
                Ok(())
            }

            Mutation::SetCodeLanguage {
                section,
                question,
                language,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                target.code_language = language.clone();
                Ok(())
            }

            Mutation::AddOption {
                section,
                question,
                text,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                target.options.push(AnswerOption::new(text.clone()));
                Ok(())
            }

            Mutation::RemoveOption {
                section,
                question,
                option,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                if *option >= target.options.len() {
                    return Err(MutationError::OptionOutOfRange(
                        *section, *question, *option,
                    ));
                }
                // A selected option may be removed; under SingleChoice this
                // leaves zero selections until the user picks again.
                target.options.remove(*option);
                Ok(())
            }

            Mutation::SetOptionText {
                section,
                question,
                option,
                text,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                let entry = target
                    .options
                    .get_mut(*option)
                    .ok_or(MutationError::OptionOutOfRange(*section, *question, *option))?;
                entry.text = text.clone();
                Ok(())
            }

            Mutation::SetOptionSelected {
                section,
                question,
                option,
                selected,
            } => {
                let target = question_mut(quiz, *section, *question)?;
                if *option >= target.options.len() {
                    return Err(MutationError::OptionOutOfRange(
                        *section, *question, *option,
                    ));
                }
                if *selected && target.kind == QuestionKind::SingleChoice {
                    target.clear_selections();
                }
                target.options[*option].selected = *selected;
                Ok(())
            }
        }
    }
}

fn section_mut(quiz: &mut Quiz, section: usize) -> Result<&mut Section, MutationError> {
    quiz.sections
        .get_mut(section)
        .ok_or(MutationError::SectionOutOfRange(section))
}

fn question_mut(
    quiz: &mut Quiz,
    section: usize,
    question: usize,
) -> Result<&mut Question, MutationError> {
    let target = section_mut(quiz, section)?;
    target
        .questions
        .get_mut(question)
        .ok_or(MutationError::QuestionOutOfRange(section, question))
}
