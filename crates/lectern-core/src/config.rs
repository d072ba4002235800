//! Lectern configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LecternError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LecternConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl LecternConfig {
    /// Load config from the default path (~/.lectern/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LecternError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LecternError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| LecternError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Reject settings that would make retrieval ill-defined.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(LecternError::invalid("retrieval.top_k must be greater than 0"));
        }
        if self.ingest.max_attempts == 0 {
            return Err(LecternError::invalid("ingest.max_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Lectern home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lectern")
    }
}

/// Word-window chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Words per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Words shared by adjacent chunks. Must be smaller than `chunk_size`.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize { 500 }
fn default_overlap() -> usize { 50 }

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(LecternError::invalid("chunk_size must be greater than 0"));
        }
        if self.overlap >= self.chunk_size {
            return Err(LecternError::InvalidArgument(format!(
                "overlap ({}) must be less than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Words the window advances per chunk.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// "lexical" or "bm25".
    #[serde(default = "default_scorer")]
    pub scorer: String,
}

fn default_top_k() -> usize { 3 }
fn default_scorer() -> String { "lexical".into() }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            scorer: default_scorer(),
        }
    }
}

/// Limits for LLM generation prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_flashcard_count")]
    pub flashcard_count: usize,
    #[serde(default = "default_quiz_questions")]
    pub quiz_questions: usize,
    /// Characters of document text sent for flashcards, quizzes and explanations.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_summary_context_chars")]
    pub summary_context_chars: usize,
}

fn default_flashcard_count() -> usize { 10 }
fn default_quiz_questions() -> usize { 5 }
fn default_max_context_chars() -> usize { 15_000 }
fn default_summary_context_chars() -> usize { 20_000 }

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            flashcard_count: default_flashcard_count(),
            quiz_questions: default_quiz_questions(),
            max_context_chars: default_max_context_chars(),
            summary_context_chars: default_summary_context_chars(),
        }
    }
}

/// Background document processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Extraction attempts before a document is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further attempt.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_pdftotext_bin")]
    pub pdftotext_bin: String,
}

fn default_max_attempts() -> u32 { 1 }
fn default_backoff_ms() -> u64 { 500 }
fn default_pdftotext_bin() -> String { "pdftotext".into() }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            pdftotext_bin: default_pdftotext_bin(),
        }
    }
}

/// Text-completion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: String,
    /// Program that reads a prompt on stdin and writes the completion to stdout.
    #[serde(default = "default_provider_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_provider_retries")]
    pub max_retries: u32,
}

fn default_provider_kind() -> String { "command".into() }
fn default_provider_command() -> String { "llm".into() }
fn default_provider_timeout() -> u64 { 120 }
fn default_provider_retries() -> u32 { 2 }

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            command: default_provider_command(),
            args: vec![],
            timeout_secs: default_provider_timeout(),
            max_retries: default_provider_retries(),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" or "memory".
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_storage_backend() -> String { "file".into() }
fn default_data_dir() -> String { "~/.lectern/data".into() }

impl StorageConfig {
    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).to_string())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            data_dir: default_data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LecternConfig::default();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.overlap, 50);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.scorer, "lexical");
        assert_eq!(config.generation.flashcard_count, 10);
        assert_eq!(config.ingest.max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [chunking]
            chunk_size = 200
            overlap = 20

            [retrieval]
            top_k = 5
            scorer = "bm25"

            [provider]
            command = "ollama"
            args = ["run", "llama3.2"]
        "#;

        let config: LecternConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.chunking.stride(), 180);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.scorer, "bm25");
        assert_eq!(config.provider.args, vec!["run", "llama3.2"]);
        assert_eq!(config.provider.timeout_secs, 120);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: LecternConfig = toml::from_str("").unwrap();
        assert_eq!(config.chunking, ChunkingConfig::default());
        assert_eq!(config.storage.backend, "file");
    }

    #[test]
    fn test_overlap_must_be_less_than_chunk_size() {
        assert!(matches!(
            ChunkingConfig::new(5, 5),
            Err(LecternError::InvalidArgument(_))
        ));
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(5, 4).is_ok());
    }

    #[test]
    fn test_load_from_rejects_invalid_chunking() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 10\noverlap = 10\n").unwrap();

        let result = LecternConfig::load_from(&path);
        assert!(matches!(result, Err(LecternError::InvalidArgument(_))));
    }

    #[test]
    fn test_home_dir() {
        let home = LecternConfig::home_dir();
        assert!(home.to_string_lossy().contains("lectern"));
    }
}
