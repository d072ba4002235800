//! File-based store: one JSON file per record.
//!
//! ```text
//! data_dir/
//!   documents/<id>.json
//!   flashcards/<id>.json
//!   quizzes/<id>.json
//!   chats/<document_id>.json
//!   access/<document_id>.json
//! ```
//!
//! Human-readable and easy to back up. Every write goes to its own uniquely
//! named temp file and is renamed into place, so readers and concurrent
//! writers never see a half-written record.
//!
//! `access/` holds only each document's `last_accessed_at`. Reads overlay it
//! onto the document, so recording an access never rewrites the document body.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_core::error::{LecternError, Result};
use lectern_core::traits::{DocumentStore, StudyStore};
use lectern_core::types::{ChatTurn, Document, FlashcardSet, Quiz};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

const DOCUMENTS: &str = "documents";
const FLASHCARDS: &str = "flashcards";
const QUIZZES: &str = "quizzes";
const CHATS: &str = "chats";
const ACCESS: &str = "access";

pub struct FileStore {
    root: PathBuf,
    /// Serializes read-modify-write of chat logs.
    chat_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        for sub in [DOCUMENTS, FLASHCARDS, QUIZZES, CHATS, ACCESS] {
            std::fs::create_dir_all(dir.join(sub))?;
        }
        tracing::debug!("📁 File store at {}", dir.display());
        Ok(Self {
            root: dir.to_path_buf(),
            chat_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, kind: &str, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(LecternError::invalid(format!("invalid record id '{id}'")));
        }
        Ok(self.root.join(kind).join(format!("{id}.json")))
    }

    async fn write_record<T: Serialize>(&self, kind: &str, id: &str, value: &T) -> Result<()> {
        let path = self.record_path(kind, id)?;
        let json = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_file_name(format!(".{id}.{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply the recorded access time, if newer than the stored one.
    async fn with_access_time(&self, mut document: Document) -> Document {
        match self.read_record::<DateTime<Utc>>(ACCESS, &document.id).await {
            Ok(Some(at)) if at > document.last_accessed_at => document.last_accessed_at = at,
            Ok(_) => {}
            Err(e) => tracing::warn!("⚠️ Ignoring access time for {}: {e}", document.id),
        }
        document
    }

    async fn read_record<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<Option<T>> {
        let path = self.record_path(kind, id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                LecternError::Store(format!("corrupt record {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_record(&self, kind: &str, id: &str) -> Result<bool> {
        let path = self.record_path(kind, id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Every parseable record of one kind. Corrupt files are logged and skipped.
    async fn read_all<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<T>> {
        let mut entries = tokio::fs::read_dir(self.root.join(kind)).await?;
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(value) => out.push(value),
                    Err(e) => tracing::warn!("⚠️ Skipping corrupt {}: {e}", path.display()),
                },
                Err(e) => tracing::warn!("⚠️ Failed to read {}: {e}", path.display()),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save_document(&self, document: &Document) -> Result<()> {
        self.write_record(DOCUMENTS, &document.id, document).await?;
        tracing::debug!("💾 Saved document {} ({})", document.id, document.status);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        match self.read_record::<Document>(DOCUMENTS, id).await? {
            Some(doc) => Ok(Some(self.with_access_time(doc).await)),
            None => Ok(None),
        }
    }

    async fn touch_document(&self, id: &str) -> Result<bool> {
        if !tokio::fs::try_exists(self.record_path(DOCUMENTS, id)?).await? {
            return Ok(false);
        }
        self.write_record(ACCESS, id, &Utc::now()).await?;
        Ok(true)
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for doc in self.read_all::<Document>(DOCUMENTS).await? {
            docs.push(self.with_access_time(doc).await);
        }
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(docs)
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let removed = self.remove_record(DOCUMENTS, id).await?;
        self.remove_record(ACCESS, id).await?;
        Ok(removed)
    }
}

#[async_trait]
impl StudyStore for FileStore {
    async fn save_flashcard_set(&self, set: &FlashcardSet) -> Result<()> {
        self.write_record(FLASHCARDS, &set.id, set).await
    }

    async fn get_flashcard_set(&self, id: &str) -> Result<Option<FlashcardSet>> {
        self.read_record(FLASHCARDS, id).await
    }

    async fn list_flashcard_sets(&self, document_id: &str) -> Result<Vec<FlashcardSet>> {
        let mut sets: Vec<FlashcardSet> = self
            .read_all::<FlashcardSet>(FLASHCARDS)
            .await?
            .into_iter()
            .filter(|s| s.document_id == document_id)
            .collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sets)
    }

    async fn delete_flashcard_set(&self, id: &str) -> Result<bool> {
        self.remove_record(FLASHCARDS, id).await
    }

    async fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        self.write_record(QUIZZES, &quiz.id, quiz).await
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>> {
        self.read_record(QUIZZES, id).await
    }

    async fn list_quizzes(&self, document_id: &str) -> Result<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = self
            .read_all::<Quiz>(QUIZZES)
            .await?
            .into_iter()
            .filter(|q| q.document_id == document_id)
            .collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quizzes)
    }

    async fn append_chat(&self, document_id: &str, turns: &[ChatTurn]) -> Result<()> {
        let _guard = self.chat_lock.lock().await;
        let mut history: Vec<ChatTurn> = self.read_record(CHATS, document_id).await?.unwrap_or_default();
        history.extend_from_slice(turns);
        self.write_record(CHATS, document_id, &history).await
    }

    async fn chat_history(&self, document_id: &str) -> Result<Vec<ChatTurn>> {
        Ok(self.read_record(CHATS, document_id).await?.unwrap_or_default())
    }

    async fn delete_for_document(&self, document_id: &str) -> Result<()> {
        let mut removed = 0usize;
        for set in self.list_flashcard_sets(document_id).await? {
            removed += self.remove_record(FLASHCARDS, &set.id).await? as usize;
        }
        for quiz in self.list_quizzes(document_id).await? {
            removed += self.remove_record(QUIZZES, &quiz.id).await? as usize;
        }
        {
            let _guard = self.chat_lock.lock().await;
            removed += self.remove_record(CHATS, document_id).await? as usize;
        }
        tracing::debug!("🗑️ Removed {removed} study records for {document_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::types::{Chunk, Difficulty, Flashcard, QuizQuestion};

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_document_persists_across_reopen() {
        let (dir, store) = store();
        let mut doc = Document::new("Cells", "cells.pdf", "/tmp/cells.pdf", 10);
        doc.mark_ready("a b c".into(), vec![Chunk::new("a b c", 0).with_page(1)]);
        store.save_document(&doc).await.unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path()).unwrap();
        let loaded = reopened.get_document(&doc.id).await.unwrap().unwrap();
        assert!(loaded.is_ready());
        assert_eq!(loaded.chunks, doc.chunks);
        assert_eq!(reopened.list_documents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let (_dir, store) = store();
        assert!(store.get_document("nope").await.unwrap().is_none());
        assert!(!store.delete_document("nope").await.unwrap());
        assert!(store.chat_history("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let (_dir, store) = store();
        let err = store.get_document("../secrets").await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_skipped_in_listing() {
        let (dir, store) = store();
        let doc = Document::new("Good", "good.txt", "/tmp/good.txt", 1);
        store.save_document(&doc).await.unwrap();
        std::fs::write(dir.path().join(DOCUMENTS).join("bad.json"), "{not json").unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(matches!(
            store.get_document("bad").await,
            Err(LecternError::Store(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_one_record() {
        let (dir, store) = store();
        let store = std::sync::Arc::new(store);
        let mut doc = Document::new("Cells", "cells.pdf", "/tmp/cells.pdf", 10);
        doc.mark_ready("a b c".into(), vec![Chunk::new("a b c", 0)]);

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let doc = doc.clone();
            tasks.push(tokio::spawn(async move {
                store.save_document(&doc).await?;
                store.touch_document(&doc.id).await?;
                store.get_document(&doc.id).await
            }));
        }
        for task in tasks {
            let loaded = task.await.unwrap().unwrap().unwrap();
            assert_eq!(loaded.chunks, doc.chunks);
        }

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join(DOCUMENTS))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from(format!("{}.json", doc.id))]);
    }

    #[tokio::test]
    async fn test_touch_keeps_document_file_and_survives_reopen() {
        let (dir, store) = store();
        let mut doc = Document::new("Cells", "cells.pdf", "/tmp/cells.pdf", 10);
        doc.last_accessed_at = doc.uploaded_at - chrono::Duration::hours(1);
        store.save_document(&doc).await.unwrap();
        let doc_file = dir.path().join(DOCUMENTS).join(format!("{}.json", doc.id));
        let before = std::fs::read(&doc_file).unwrap();

        assert!(store.touch_document(&doc.id).await.unwrap());
        assert_eq!(std::fs::read(&doc_file).unwrap(), before);

        let reopened = FileStore::open(dir.path()).unwrap();
        let loaded = reopened.get_document(&doc.id).await.unwrap().unwrap();
        assert!(loaded.last_accessed_at > doc.last_accessed_at);
        assert!(reopened.list_documents().await.unwrap()[0].last_accessed_at > doc.last_accessed_at);
    }

    #[tokio::test]
    async fn test_touch_missing_or_deleted_document() {
        let (dir, store) = store();
        assert!(!store.touch_document("nope").await.unwrap());

        let doc = Document::new("Cells", "cells.pdf", "/tmp/cells.pdf", 10);
        store.save_document(&doc).await.unwrap();
        store.touch_document(&doc.id).await.unwrap();
        assert!(store.delete_document(&doc.id).await.unwrap());
        assert!(!store.touch_document(&doc.id).await.unwrap());
        assert_eq!(std::fs::read_dir(dir.path().join(ACCESS)).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_study_records_and_cascade() {
        let (_dir, store) = store();
        let set = FlashcardSet::new("doc-1", vec![Flashcard::new("Q", "A", Difficulty::Hard)]);
        let question = QuizQuestion {
            question: "2+2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_answer: "4".into(),
            explanation: String::new(),
            difficulty: Difficulty::Easy,
        };
        let quiz = Quiz::new("doc-1", "Arithmetic", vec![question]);
        store.save_flashcard_set(&set).await.unwrap();
        store.save_quiz(&quiz).await.unwrap();
        store.append_chat("doc-1", &[ChatTurn::user("hi")]).await.unwrap();
        store
            .append_chat("doc-1", &[ChatTurn::assistant("hello", vec![2])])
            .await
            .unwrap();

        assert_eq!(store.chat_history("doc-1").await.unwrap().len(), 2);
        assert_eq!(store.list_quizzes("doc-1").await.unwrap()[0].title, "Arithmetic");
        assert!(store.list_flashcard_sets("doc-2").await.unwrap().is_empty());

        store.delete_for_document("doc-1").await.unwrap();
        assert!(store.get_flashcard_set(&set.id).await.unwrap().is_none());
        assert!(store.get_quiz(&quiz.id).await.unwrap().is_none());
        assert!(store.chat_history("doc-1").await.unwrap().is_empty());
    }
}
