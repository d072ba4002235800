//! # Lectern Memory
//!
//! Storage backends for documents, flashcard sets, quizzes and chat history.
//! - `file`: JSON files under `data_dir` (default)
//! - `memory`: process-local, for tests and throwaway sessions

pub mod file;
pub mod memory;

use std::sync::Arc;

use lectern_core::config::StorageConfig;
use lectern_core::error::{LecternError, Result};
use lectern_core::traits::{DocumentStore, StudyStore};

pub use file::FileStore;
pub use memory::MemoryStore;

/// One backend viewed through both storage traits.
#[derive(Clone)]
pub struct Stores {
    pub documents: Arc<dyn DocumentStore>,
    pub study: Arc<dyn StudyStore>,
}

impl Stores {
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: DocumentStore + StudyStore + 'static,
    {
        Self {
            documents: backend.clone(),
            study: backend,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.documents.name()
    }
}

/// Create the storage backend named in config.
pub fn create_store(config: &StorageConfig) -> Result<Stores> {
    match config.backend.as_str() {
        "file" => {
            let dir = config.data_path();
            Ok(Stores::from_backend(Arc::new(FileStore::open(&dir)?)))
        }
        "memory" => Ok(Stores::from_backend(Arc::new(MemoryStore::new()))),
        other => Err(LecternError::Config(format!(
            "Unknown storage backend: {other}. Use 'file' or 'memory'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_store_by_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            backend: "file".into(),
            data_dir: dir.path().display().to_string(),
        };
        assert_eq!(create_store(&config).unwrap().backend_name(), "file");
        assert!(dir.path().join("documents").is_dir());

        let config = StorageConfig {
            backend: "memory".into(),
            ..StorageConfig::default()
        };
        assert_eq!(create_store(&config).unwrap().backend_name(), "memory");

        let config = StorageConfig {
            backend: "postgres".into(),
            ..StorageConfig::default()
        };
        assert!(matches!(create_store(&config), Err(LecternError::Config(_))));
    }
}
