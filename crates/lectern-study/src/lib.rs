//! # Lectern Study
//!
//! Study flows on top of the retrieval core:
//! - grounded chat with chunk citations and per-document history
//! - concept explanation from the most relevant chunks
//! - flashcard and quiz generation, review and grading
//! - document summaries

pub mod assistant;
pub mod flashcards;
pub mod parser;
pub mod prompts;
pub mod quiz;

pub use assistant::{GroundedAnswer, StudyAssistant};
pub use quiz::{AnswerInput, QuizResults};
