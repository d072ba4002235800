//! Study assistant: grounded chat, concept explanation, flashcards, quizzes
//! and summaries over one processed document.
//!
//! Every flow loads the document first and refuses to run unless it is
//! `ready`. Retrieval itself is delegated to [`Retriever`]; this module only
//! decides what goes into the prompt and what gets persisted.

use std::sync::Arc;

use lectern_core::config::GenerationConfig;
use lectern_core::error::{LecternError, Result};
use lectern_core::traits::{DocumentStore, Provider, StudyStore};
use lectern_core::types::{Chunk, ChatTurn, Document, FlashcardSet, Quiz};
use lectern_knowledge::Retriever;
use serde::Serialize;

use crate::{parser, prompts};

/// An answer and the chunks it was grounded on, most relevant first.
#[derive(Debug, Clone, Serialize)]
pub struct GroundedAnswer {
    pub text: String,
    pub chunks: Vec<Chunk>,
}

impl GroundedAnswer {
    /// `chunk_index` of every cited chunk.
    pub fn citations(&self) -> Vec<usize> {
        self.chunks.iter().map(|c| c.chunk_index).collect()
    }
}

pub struct StudyAssistant {
    pub(crate) documents: Arc<dyn DocumentStore>,
    pub(crate) study: Arc<dyn StudyStore>,
    provider: Arc<dyn Provider>,
    retriever: Retriever,
    generation: GenerationConfig,
}

impl StudyAssistant {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        study: Arc<dyn StudyStore>,
        provider: Arc<dyn Provider>,
        retriever: Retriever,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            documents,
            study,
            provider,
            retriever,
            generation,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Load a document regardless of status.
    pub async fn document(&self, document_id: &str) -> Result<Document> {
        self.documents
            .get_document(document_id)
            .await?
            .ok_or_else(|| LecternError::DocumentNotFound(document_id.to_string()))
    }

    /// All documents, newest first.
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        self.documents.list_documents().await
    }

    /// Load a `ready` document and record the access. The document body is
    /// never written back, so concurrent flows on one document cannot clobber
    /// each other or a running ingestion.
    async fn ready_document(&self, document_id: &str) -> Result<Document> {
        let mut document = self.document(document_id).await?;
        document.ensure_ready()?;
        match self.documents.touch_document(document_id).await {
            Ok(_) => document.touch(),
            Err(e) => tracing::warn!("⚠️ Could not record access to {document_id}: {e}"),
        }
        Ok(document)
    }

    async fn complete(&self, flow: &str, prompt: &str) -> Result<String> {
        tracing::debug!("{flow}: prompting {} ({} chars)", self.provider.name(), prompt.len());
        let text = self.provider.complete(prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(LecternError::Provider(format!("{flow}: empty completion")));
        }
        Ok(text.to_string())
    }

    /// Top-k chunks of a ready document for `query`, without calling the provider.
    pub async fn search(&self, document_id: &str, query: &str, k: usize) -> Result<Vec<Chunk>> {
        positive(k, "k")?;
        let document = self.ready_document(document_id).await?;
        self.retriever.retrieve_k(&document.chunks, query, k)
    }

    /// Answer a question from the document's most relevant chunks and record
    /// both turns in the chat history.
    pub async fn chat(&self, document_id: &str, question: &str) -> Result<GroundedAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LecternError::invalid("question must not be empty"));
        }
        let document = self.ready_document(document_id).await?;
        let chunks = self.retriever.retrieve(&document.chunks, question)?;
        if chunks.is_empty() {
            tracing::debug!("chat: no chunks for {document_id}, answering without context");
        }

        let text = self.complete("chat", &prompts::chat(question, &chunks)).await?;
        let answer = GroundedAnswer { text, chunks };

        self.study
            .append_chat(
                document_id,
                &[
                    ChatTurn::user(question),
                    ChatTurn::assistant(answer.text.clone(), answer.citations()),
                ],
            )
            .await?;
        tracing::info!(
            "💬 Answered question on {document_id} citing chunks {:?}",
            answer.citations()
        );
        Ok(answer)
    }

    pub async fn chat_history(&self, document_id: &str) -> Result<Vec<ChatTurn>> {
        self.document(document_id).await?;
        self.study.chat_history(document_id).await
    }

    /// Explain `concept` using the content of the chunks most relevant to it.
    pub async fn explain_concept(&self, document_id: &str, concept: &str) -> Result<GroundedAnswer> {
        let concept = concept.trim();
        if concept.is_empty() {
            return Err(LecternError::invalid("concept must not be empty"));
        }
        let document = self.ready_document(document_id).await?;
        let chunks = self.retriever.retrieve(&document.chunks, concept)?;
        let prompt = prompts::explain(concept, &chunks, self.generation.max_context_chars);
        let text = self.complete("explain", &prompt).await?;
        Ok(GroundedAnswer { text, chunks })
    }

    /// Generate and persist a flashcard set. `count` defaults to the configured value.
    pub async fn generate_flashcards(
        &self,
        document_id: &str,
        count: Option<usize>,
    ) -> Result<FlashcardSet> {
        let count = positive(count.unwrap_or(self.generation.flashcard_count), "count")?;
        let document = self.ready_document(document_id).await?;
        let text = require_text(&document)?;

        let prompt = prompts::flashcards(text, count, self.generation.max_context_chars);
        let response = self.complete("flashcards", &prompt).await?;
        let cards = parser::parse_flashcards(&response, count);
        if cards.is_empty() {
            return Err(LecternError::Parse("no flashcards in provider response".into()));
        }

        let set = FlashcardSet::new(&document.id, cards);
        self.study.save_flashcard_set(&set).await?;
        tracing::info!("🃏 Generated {} flashcards for {}", set.cards.len(), document.id);
        Ok(set)
    }

    /// Generate and persist a quiz. `questions` defaults to the configured value.
    pub async fn generate_quiz(
        &self,
        document_id: &str,
        questions: Option<usize>,
        title: Option<&str>,
    ) -> Result<Quiz> {
        let n = positive(questions.unwrap_or(self.generation.quiz_questions), "questions")?;
        let document = self.ready_document(document_id).await?;
        let text = require_text(&document)?;

        let prompt = prompts::quiz(text, n, self.generation.max_context_chars);
        let response = self.complete("quiz", &prompt).await?;
        let parsed = parser::parse_quiz(&response, n);
        if parsed.is_empty() {
            return Err(LecternError::Parse("no quiz questions in provider response".into()));
        }

        let title = match title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => format!("{} - Quiz", document.title),
        };
        let quiz = Quiz::new(&document.id, title, parsed);
        self.study.save_quiz(&quiz).await?;
        tracing::info!("📝 Generated quiz {} ({} questions)", quiz.id, quiz.total_questions);
        Ok(quiz)
    }

    pub async fn summarize(&self, document_id: &str) -> Result<String> {
        let document = self.ready_document(document_id).await?;
        let text = require_text(&document)?;
        let prompt = prompts::summary(text, self.generation.summary_context_chars);
        self.complete("summary", &prompt).await
    }

    /// Delete a document together with its flashcards, quizzes and chat history.
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.document(document_id).await?;
        self.study.delete_for_document(document_id).await?;
        self.documents.delete_document(document_id).await?;
        tracing::info!("🗑️ Deleted document {document_id}");
        Ok(())
    }
}

fn positive(n: usize, what: &str) -> Result<usize> {
    if n == 0 {
        return Err(LecternError::InvalidArgument(format!("{what} must be greater than 0")));
    }
    Ok(n)
}

fn require_text(document: &Document) -> Result<&str> {
    let text = document.extracted_text.trim();
    if text.is_empty() {
        return Err(LecternError::InvalidArgument(format!(
            "document {} has no extracted text",
            document.id
        )));
    }
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use lectern_core::types::{ChatRole, DocumentStatus};
    use lectern_knowledge::Chunker;
    use lectern_memory::{FileStore, MemoryStore};
    use std::sync::Mutex;

    /// Returns canned responses in order and records every prompt.
    pub(crate) struct ScriptedProvider {
        responses: Mutex<Vec<String>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| LecternError::Provider("script exhausted".into()))
        }
    }

    pub(crate) const FOX: &str = "the quick brown fox jumps over the lazy dog";

    pub(crate) async fn setup(
        responses: &[&str],
    ) -> (StudyAssistant, Arc<MemoryStore>, Arc<ScriptedProvider>, Document) {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(ScriptedProvider::new(responses));
        let mut doc = Document::new("Fox", "fox.txt", "/tmp/fox.txt", 43);
        doc.mark_ready(FOX.to_string(), Chunker::new(4, 1).unwrap().chunk(FOX));
        store.save_document(&doc).await.unwrap();

        let assistant = StudyAssistant::new(
            store.clone(),
            store.clone(),
            provider.clone(),
            Retriever::default(),
            GenerationConfig::default(),
        );
        (assistant, store, provider, doc)
    }

    #[tokio::test]
    async fn test_chat_grounds_and_records_history() {
        let (assistant, _store, provider, doc) = setup(&["A fox."]).await;

        let answer = assistant.chat(&doc.id, "quick fox").await.unwrap();
        assert_eq!(answer.text, "A fox.");
        assert_eq!(answer.citations(), vec![0, 1, 2]);

        let prompt = provider.last_prompt();
        assert!(prompt.contains("[Chunk 1]\nthe quick brown fox\n\n[Chunk 2]\nfox jumps over the"));
        assert!(prompt.contains("Question:\nquick fox"));

        let history = assistant.chat_history(&doc.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].relevant_chunks, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_flows_require_ready_document() {
        let (assistant, store, _provider, _doc) = setup(&["unused"]).await;
        let pending = Document::new("Pending", "p.pdf", "/tmp/p.pdf", 1);
        store.save_document(&pending).await.unwrap();

        let err = assistant.chat(&pending.id, "anything").await.unwrap_err();
        assert!(matches!(
            err,
            LecternError::DocumentNotReady { status: DocumentStatus::Processing, .. }
        ));
        assert!(matches!(
            assistant.summarize("missing").await,
            Err(LecternError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_explain_uses_chunk_content() {
        let (assistant, _store, provider, doc) = setup(&["Foxes are canids."]).await;

        let answer = assistant.explain_concept(&doc.id, "lazy dog").await.unwrap();
        assert_eq!(answer.text, "Foxes are canids.");
        assert_eq!(answer.chunks[0].chunk_index, 2);
        assert!(provider.last_prompt().contains("the lazy dog"));
    }

    #[tokio::test]
    async fn test_generate_flashcards_persists_set() {
        let response = "Q: What jumps?\nA: The fox\nD: easy\n---\nQ: Who is lazy?\nA: The dog\nD: hard";
        let (assistant, store, provider, doc) = setup(&[response]).await;

        let set = assistant.generate_flashcards(&doc.id, Some(1)).await.unwrap();
        assert_eq!(set.cards.len(), 1);
        assert!(provider.last_prompt().contains("Generate 1 educational flashcards"));
        assert_eq!(store.list_flashcard_sets(&doc.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_flashcards_are_not_saved() {
        let (assistant, store, _provider, doc) = setup(&["Sorry, I can't help."]).await;
        let err = assistant.generate_flashcards(&doc.id, None).await.unwrap_err();
        assert!(matches!(err, LecternError::Parse(_)));
        assert!(store.list_flashcard_sets(&doc.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_quiz_default_title() {
        let response = "Q: What color is the fox?\n01: red\n02: brown\n03: blue\n04: green\nC: brown\nE: It says so.\nD: easy";
        let (assistant, _store, _provider, doc) = setup(&[response]).await;

        let quiz = assistant.generate_quiz(&doc.id, None, None).await.unwrap();
        assert_eq!(quiz.title, "Fox - Quiz");
        assert_eq!(quiz.total_questions, 1);
        assert_eq!(quiz.questions[0].correct_answer, "brown");
    }

    #[tokio::test]
    async fn test_summary_and_zero_count() {
        let (assistant, _store, _provider, doc) = setup(&["A fox jumps a dog."]).await;
        assert!(matches!(
            assistant.generate_flashcards(&doc.id, Some(0)).await,
            Err(LecternError::InvalidArgument(_))
        ));
        assert_eq!(assistant.summarize(&doc.id).await.unwrap(), "A fox jumps a dog.");
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let (assistant, store, _provider, doc) = setup(&[]).await;
        let err = assistant.chat(&doc.id, "fox").await.unwrap_err();
        assert!(matches!(err, LecternError::Provider(_)));
        assert!(store.chat_history(&doc.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_document_cascades() {
        let response = "Q: q\nA: a";
        let (assistant, store, _provider, doc) = setup(&[response, "hi"]).await;
        assistant.generate_flashcards(&doc.id, None).await.unwrap();
        assistant.chat(&doc.id, "fox").await.unwrap();

        assistant.delete_document(&doc.id).await.unwrap();
        assert!(store.get_document(&doc.id).await.unwrap().is_none());
        assert!(store.list_flashcard_sets(&doc.id).await.unwrap().is_empty());
        assert!(store.chat_history(&doc.id).await.unwrap().is_empty());
        assert!(matches!(
            assistant.delete_document(&doc.id).await,
            Err(LecternError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_search_without_provider() {
        let (assistant, _store, provider, doc) = setup(&[]).await;
        let chunks = assistant.search(&doc.id, "quick fox", 2).await.unwrap();
        let idx: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(idx, vec![0, 1]);
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_zero_k_before_loading() {
        let (assistant, store, _provider, doc) = setup(&[]).await;
        let pending = Document::new("Pending", "p.pdf", "/tmp/p.pdf", 1);
        store.save_document(&pending).await.unwrap();

        for id in [doc.id.as_str(), pending.id.as_str(), "missing"] {
            assert!(matches!(
                assistant.search(id, "fox", 0).await,
                Err(LecternError::InvalidArgument(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_flows_record_access_without_rewriting_document() {
        let (assistant, store, _provider, mut doc) = setup(&[]).await;
        doc.last_accessed_at = doc.uploaded_at - chrono::Duration::hours(1);
        store.save_document(&doc).await.unwrap();

        let loaded = store.get_document(&doc.id).await.unwrap().unwrap();
        assistant.search(&doc.id, "fox", 1).await.unwrap();
        let touched = store.get_document(&doc.id).await.unwrap().unwrap();
        assert!(touched.last_accessed_at > loaded.last_accessed_at);
        assert_eq!(touched.chunks, loaded.chunks);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_searches_on_file_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let mut doc = Document::new("Fox", "fox.txt", "/tmp/fox.txt", 43);
        doc.mark_ready(FOX.to_string(), Chunker::new(4, 1).unwrap().chunk(FOX));
        store.save_document(&doc).await.unwrap();
        let assistant = Arc::new(StudyAssistant::new(
            store.clone(),
            store.clone(),
            Arc::new(ScriptedProvider::new(&[])),
            Retriever::default(),
            GenerationConfig::default(),
        ));

        let mut tasks = Vec::new();
        for _ in 0..64 {
            let assistant = assistant.clone();
            let id = doc.id.clone();
            tasks.push(tokio::spawn(async move { assistant.search(&id, "quick fox", 2).await }));
        }
        for task in tasks {
            let chunks = task.await.unwrap().unwrap();
            assert_eq!(chunks.len(), 2);
        }
        let stored = store.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(stored.chunks, doc.chunks);
    }
}
