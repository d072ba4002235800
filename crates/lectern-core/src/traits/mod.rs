//! Seams between the retrieval core and its collaborators.

pub mod provider;
pub mod store;

pub use provider::Provider;
pub use store::{DocumentStore, StudyStore};
