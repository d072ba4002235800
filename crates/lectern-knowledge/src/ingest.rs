//! Background document processing: extract → chunk → mark ready.
//!
//! `submit` records the document as `processing` and returns at once; the
//! extraction runs on a spawned tokio task and moves the document to `ready`
//! or `failed`. Retrieval must only run against `ready` documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lectern_core::config::{ChunkingConfig, IngestConfig};
use lectern_core::error::{LecternError, Result};
use lectern_core::traits::DocumentStore;
use lectern_core::types::{Document, DocumentStatus};

use crate::chunker::Chunker;
use crate::extract::{TextExtractor, extractor_for};

/// How often extraction is attempted before a document is marked failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay after the given failed attempt (1-based); doubles each time.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1u32 << shift)
    }
}

type ExtractorResolver = Arc<dyn Fn(&Path) -> Result<Arc<dyn TextExtractor>> + Send + Sync>;

/// Accepts uploads and turns them into chunked, ready documents.
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn DocumentStore>,
    chunker: Chunker,
    retry: RetryPolicy,
    resolver: ExtractorResolver,
}

impl Ingestor {
    /// Extractors are chosen per file extension.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        chunking: ChunkingConfig,
        ingest: &IngestConfig,
    ) -> Result<Self> {
        let ingest_config = ingest.clone();
        let resolver: ExtractorResolver =
            Arc::new(move |path: &Path| -> Result<Arc<dyn TextExtractor>> {
                Ok(Arc::from(extractor_for(path, &ingest_config)?))
            });
        Ok(Self {
            store,
            chunker: Chunker::from_config(chunking)?,
            retry: RetryPolicy::from_config(ingest),
            resolver,
        })
    }

    /// Use one extractor for every file.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.resolver =
            Arc::new(move |_: &Path| -> Result<Arc<dyn TextExtractor>> { Ok(extractor.clone()) });
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Record the upload and start processing it in the background.
    ///
    /// Returns the document in the `processing` state. Unsupported file types
    /// and unreadable files are rejected before anything is stored.
    pub async fn submit(&self, path: &Path, title: Option<&str>) -> Result<Document> {
        (self.resolver)(path)?;
        let meta = tokio::fs::metadata(path).await?;

        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let title = match title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| filename.clone()),
        };

        let document = Document::new(title, filename, path.display().to_string(), meta.len());
        self.store.save_document(&document).await?;
        tracing::info!("📄 Document accepted: '{}' ({})", document.title, document.id);

        let this = self.clone();
        let id = document.id.clone();
        let path: PathBuf = path.to_path_buf();
        tokio::spawn(async move {
            if let Err(e) = this.process(&id, &path).await {
                tracing::warn!("⚠️ Processing of {id} could not be recorded: {e}");
            }
        });

        Ok(document)
    }

    /// Extract, chunk and persist one document.
    ///
    /// Extraction failures are recorded on the document (status `failed`)
    /// rather than returned; only store errors and a missing record are `Err`.
    /// Returns `None` if the document was deleted while it was being
    /// processed; nothing is written in that case.
    pub async fn process(&self, document_id: &str, path: &Path) -> Result<Option<Document>> {
        let mut document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or_else(|| LecternError::DocumentNotFound(document_id.to_string()))?;

        match self.extract_with_retry(path).await {
            Ok(text) => {
                let chunks = self.chunker.chunk(&text);
                tracing::info!(
                    "✅ Document processed: {} ({} chunks)",
                    document_id,
                    chunks.len()
                );
                document.mark_ready(text, chunks);
            }
            Err(e) => {
                tracing::warn!("❌ Processing failed for {document_id}: {e}");
                document.mark_failed(e.to_string());
            }
        }

        if self.store.get_document(document_id).await?.is_none() {
            tracing::info!("🗑️ Document {document_id} was deleted during processing; discarding result");
            return Ok(None);
        }
        self.store.save_document(&document).await?;
        Ok(Some(document))
    }

    async fn extract_with_retry(&self, path: &Path) -> Result<String> {
        let extractor = (self.resolver)(path)?;
        let mut attempt = 1;
        loop {
            match extractor.extract(path).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        "🔁 {} attempt {attempt}/{} failed: {e}; retrying in {delay:?}",
                        extractor.name(),
                        self.retry.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll until the document leaves `processing`.
    pub async fn wait_until_settled(
        &self,
        document_id: &str,
        poll: Duration,
        timeout: Duration,
    ) -> Result<Document> {
        let wait = async {
            loop {
                let document = self
                    .store
                    .get_document(document_id)
                    .await?
                    .ok_or_else(|| LecternError::DocumentNotFound(document_id.to_string()))?;
                if document.status != DocumentStatus::Processing {
                    return Ok(document);
                }
                tokio::time::sleep(poll).await;
            }
        };
        tokio::time::timeout(timeout, wait).await.map_err(|_| {
            LecternError::Other(format!(
                "document {document_id} still processing after {timeout:?}"
            ))
        })?
    }
}
