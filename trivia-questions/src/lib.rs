//! Trivia question generation
//!
//! Asks an LLM for multiple-choice questions in a fixed plain-text layout
//! and parses the completion into [`GeneratedQuestion`]s.

pub mod error;
pub mod generator;
pub mod parser;

pub use error::{QuestionError, Result};
pub use generator::{Difficulty, QuestionGenerator};
pub use parser::{parse_question, parse_questions, GeneratedQuestion};
