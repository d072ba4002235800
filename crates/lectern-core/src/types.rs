//! Shared data model: documents, chunks, and study artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};

/// A contiguous, bounded slice of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The words of this window joined by single spaces.
    pub content: String,
    /// Zero-based position in the owning document's chunk sequence.
    #[serde(alias = "chunkIndex", alias = "chunkNumber", alias = "chunk_number")]
    pub chunk_index: usize,
    /// 1-based page of the chunk's first word, or 0 when unknown.
    #[serde(default, alias = "pageNumber")]
    pub page_number: u32,
}

impl Chunk {
    pub fn new(content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            content: content.into(),
            chunk_index,
            page_number: 0,
        }
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = page_number;
        self
    }
}

/// A chunk paired with its relevance to one query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Non-negative; higher is more relevant.
    pub score: f64,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, score: f64) -> Self {
        Self { chunk, score }
    }
}

/// Processing state of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Processing,
    Ready,
    Failed,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An uploaded study document and its chunk sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub file_path: String,
    pub file_size: u64,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub status: DocumentStatus,
    /// Last processing error, set when status is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Document {
    /// Create a document record in the `processing` state.
    pub fn new(
        title: impl Into<String>,
        filename: impl Into<String>,
        file_path: impl Into<String>,
        file_size: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            filename: filename.into(),
            file_path: file_path.into(),
            file_size,
            extracted_text: String::new(),
            chunks: Vec::new(),
            status: DocumentStatus::Processing,
            error: None,
            uploaded_at: now,
            last_accessed_at: now,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == DocumentStatus::Ready
    }

    /// Callers must gate retrieval and generation on this.
    pub fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(LecternError::DocumentNotReady {
                id: self.id.clone(),
                status: self.status,
            })
        }
    }

    pub fn mark_ready(&mut self, extracted_text: String, chunks: Vec<Chunk>) {
        self.extracted_text = extracted_text;
        self.chunks = chunks;
        self.status = DocumentStatus::Ready;
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = DocumentStatus::Failed;
        self.error = Some(error.into());
    }

    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Map a free-form label to a difficulty; unknown labels become `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_starred: bool,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: new_id(),
            question: question.into(),
            answer: answer.into(),
            difficulty,
            review_count: 0,
            last_reviewed_at: None,
            is_starred: false,
        }
    }
}

/// Flashcards generated from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub id: String,
    pub document_id: String,
    pub cards: Vec<Flashcard>,
    pub created_at: DateTime<Utc>,
}

impl FlashcardSet {
    pub fn new(document_id: impl Into<String>, cards: Vec<Flashcard>) -> Self {
        Self {
            id: new_id(),
            document_id: document_id.into(),
            cards,
            created_at: Utc::now(),
        }
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Flashcard> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }
}

/// A multiple-choice question with exactly four options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_index: usize,
    pub selected_answer: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub user_answers: Vec<UserAnswer>,
    /// Percentage of correct answers, set on submission.
    #[serde(default)]
    pub score: u32,
    pub total_questions: usize,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn new(
        document_id: impl Into<String>,
        title: impl Into<String>,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        let total_questions = questions.len();
        Self {
            id: new_id(),
            document_id: document_id.into(),
            title: title.into(),
            questions,
            user_answers: Vec::new(),
            score: 0,
            total_questions,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a document's chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// `chunk_index` values of the chunks used to ground an assistant answer.
    #[serde(default)]
    pub relevant_chunks: Vec<usize>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            relevant_chunks: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, relevant_chunks: Vec<usize>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            relevant_chunks,
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
