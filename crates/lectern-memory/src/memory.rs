//! In-process store. Nothing survives a restart; used by tests and `backend = "memory"`.

use std::collections::HashMap;

use async_trait::async_trait;
use lectern_core::error::Result;
use lectern_core::traits::{DocumentStore, StudyStore};
use lectern_core::types::{ChatTurn, Document, FlashcardSet, Quiz};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Document>>,
    flashcard_sets: RwLock<HashMap<String, FlashcardSet>>,
    quizzes: RwLock<HashMap<String, Quiz>>,
    chats: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save_document(&self, document: &Document) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn touch_document(&self, id: &str) -> Result<bool> {
        match self.documents.write().await.get_mut(id) {
            Some(doc) => {
                doc.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = self.documents.read().await.values().cloned().collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(docs)
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        Ok(self.documents.write().await.remove(id).is_some())
    }
}

#[async_trait]
impl StudyStore for MemoryStore {
    async fn save_flashcard_set(&self, set: &FlashcardSet) -> Result<()> {
        self.flashcard_sets
            .write()
            .await
            .insert(set.id.clone(), set.clone());
        Ok(())
    }

    async fn get_flashcard_set(&self, id: &str) -> Result<Option<FlashcardSet>> {
        Ok(self.flashcard_sets.read().await.get(id).cloned())
    }

    async fn list_flashcard_sets(&self, document_id: &str) -> Result<Vec<FlashcardSet>> {
        let mut sets: Vec<FlashcardSet> = self
            .flashcard_sets
            .read()
            .await
            .values()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sets)
    }

    async fn delete_flashcard_set(&self, id: &str) -> Result<bool> {
        Ok(self.flashcard_sets.write().await.remove(id).is_some())
    }

    async fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        self.quizzes.write().await.insert(quiz.id.clone(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }

    async fn list_quizzes(&self, document_id: &str) -> Result<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = self
            .quizzes
            .read()
            .await
            .values()
            .filter(|q| q.document_id == document_id)
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quizzes)
    }

    async fn append_chat(&self, document_id: &str, turns: &[ChatTurn]) -> Result<()> {
        self.chats
            .write()
            .await
            .entry(document_id.to_string())
            .or_default()
            .extend_from_slice(turns);
        Ok(())
    }

    async fn chat_history(&self, document_id: &str) -> Result<Vec<ChatTurn>> {
        Ok(self
            .chats
            .read()
            .await
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_for_document(&self, document_id: &str) -> Result<()> {
        self.flashcard_sets
            .write()
            .await
            .retain(|_, s| s.document_id != document_id);
        self.quizzes
            .write()
            .await
            .retain(|_, q| q.document_id != document_id);
        self.chats.write().await.remove(document_id);
        Ok(())
    }
}
