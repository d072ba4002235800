//! Storage traits for documents and study artifacts.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatTurn, Document, FlashcardSet, Quiz};

/// Persists documents together with their chunk sequence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    /// Insert or replace a document.
    async fn save_document(&self, document: &Document) -> Result<()>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Set `last_accessed_at` to now without rewriting the document body.
    /// Returns `false` if no such document exists.
    async fn touch_document(&self, id: &str) -> Result<bool>;

    /// All documents, most recently uploaded first.
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Returns `false` if no such document existed.
    async fn delete_document(&self, id: &str) -> Result<bool>;
}

/// Persists flashcard sets, quizzes and chat history, all keyed by document.
#[async_trait]
pub trait StudyStore: Send + Sync {
    async fn save_flashcard_set(&self, set: &FlashcardSet) -> Result<()>;

    async fn get_flashcard_set(&self, id: &str) -> Result<Option<FlashcardSet>>;

    /// Sets for one document, newest first.
    async fn list_flashcard_sets(&self, document_id: &str) -> Result<Vec<FlashcardSet>>;

    async fn delete_flashcard_set(&self, id: &str) -> Result<bool>;

    async fn save_quiz(&self, quiz: &Quiz) -> Result<()>;

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>>;

    /// Quizzes for one document, newest first.
    async fn list_quizzes(&self, document_id: &str) -> Result<Vec<Quiz>>;

    async fn append_chat(&self, document_id: &str, turns: &[ChatTurn]) -> Result<()>;

    /// Chat turns for one document in the order they were appended.
    async fn chat_history(&self, document_id: &str) -> Result<Vec<ChatTurn>>;

    /// Remove every artifact that belongs to `document_id`.
    async fn delete_for_document(&self, document_id: &str) -> Result<()>;
}
