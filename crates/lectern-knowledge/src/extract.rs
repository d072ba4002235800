//! Text extraction from uploaded files.

use std::path::Path;

use async_trait::async_trait;
use lectern_core::config::IngestConfig;
use lectern_core::error::{LecternError, Result};

/// Turns a file on disk into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, path: &Path) -> Result<String>;
}

/// PDF extraction via poppler's `pdftotext`.
///
/// Output keeps the form feed `pdftotext` writes between pages, which the
/// chunker uses for page attribution.
pub struct PdfTextExtractor {
    bin: String,
}

impl PdfTextExtractor {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    fn name(&self) -> &str {
        "pdftotext"
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let output = tokio::process::Command::new(&self.bin)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => Ok(String::from_utf8_lossy(&out.stdout).into_owned()),
            Ok(out) => Err(LecternError::Extraction(format!(
                "{} failed on {}: {}",
                self.bin,
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LecternError::Extraction(
                format!("{} not found; install poppler-utils", self.bin),
            )),
            Err(e) => Err(LecternError::Io(e)),
        }
    }
}

/// Reads UTF-8 text and markdown files as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain"
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        String::from_utf8(bytes).map_err(|_| {
            LecternError::Extraction(format!("{} is not valid UTF-8 text", path.display()))
        })
    }
}

/// Pick an extractor by file extension.
pub fn extractor_for(path: &Path, config: &IngestConfig) -> Result<Box<dyn TextExtractor>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(Box::new(PdfTextExtractor::new(&config.pdftotext_bin))),
        "txt" | "text" | "md" | "markdown" => Ok(Box::new(PlainTextExtractor)),
        "" => Err(LecternError::Extraction(format!(
            "{} has no file extension",
            path.display()
        ))),
        other => Err(LecternError::Extraction(format!(
            "unsupported file type '.{other}' (expected .pdf, .txt or .md)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extractor_for_extension() {
        let config = IngestConfig::default();
        assert_eq!(
            extractor_for(&PathBuf::from("a/Lecture.PDF"), &config).unwrap().name(),
            "pdftotext"
        );
        assert_eq!(
            extractor_for(&PathBuf::from("notes.md"), &config).unwrap().name(),
            "plain"
        );
        assert!(extractor_for(&PathBuf::from("slides.pptx"), &config).is_err());
        assert!(extractor_for(&PathBuf::from("README"), &config).is_err());
    }

    #[tokio::test]
    async fn test_plain_text_extraction() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Cells divide by mitosis.").unwrap();

        let text = PlainTextExtractor.extract(&path).await.unwrap();
        assert_eq!(text, "Cells divide by mitosis.");
    }

    #[tokio::test]
    async fn test_plain_text_rejects_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blob.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let err = PlainTextExtractor.extract(&path).await.unwrap_err();
        assert!(matches!(err, LecternError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_missing_pdftotext_binary() {
        let extractor = PdfTextExtractor::new("lectern-no-such-pdftotext");
        let err = extractor.extract(Path::new("doc.pdf")).await.unwrap_err();
        assert!(matches!(err, LecternError::Extraction(msg) if msg.contains("not found")));
    }
}
