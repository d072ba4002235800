//! # Lectern Core
//!
//! Shared types, traits, configuration and errors for the Lectern study assistant.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::LecternConfig;
pub use error::{LecternError, Result};
pub use types::{Chunk, Document, DocumentStatus, ScoredChunk};
