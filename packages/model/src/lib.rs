//! # Quizforge Model
//!
//! Serializable data model for authored quizzes.
//!
//! A quiz is a tree: Quiz → Sections → Questions → AnswerOptions. The tree
//! carries no editing state and no binary payloads, so it can be sent to the
//! persistence layer as-is. Everything stateful (pending attachments, edit
//! versions, validation) lives in `quizforge-editor`.

pub mod tree;

pub use tree::{
    AnswerOption, Question, QuestionId, QuestionKind, Quiz, QuizId, Section, SectionId,
};
