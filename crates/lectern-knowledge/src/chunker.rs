//! Word-window chunking with overlap.
//!
//! Text is split on runs of whitespace (punctuation stays attached to its word)
//! and grouped into windows of `chunk_size` words. Each window starts
//! `chunk_size - overlap` words after the previous one, so adjacent chunks share
//! exactly `overlap` words. The final window takes whatever is left and may be
//! shorter.
//!
//! ```text
//! chunk_size=4, overlap=1
//! the quick brown fox jumps over the lazy dog
//! [the quick brown fox]
//!                  [fox jumps over the]
//!                                 [the lazy dog]
//! ```
//!
//! Page attribution: extracted PDF text separates pages with form feeds. When
//! the text has any, a chunk's `page_number` is the 1-based page of its first
//! word; otherwise it stays 0 (unknown).

use lectern_core::config::ChunkingConfig;
use lectern_core::error::Result;
use lectern_core::types::Chunk;

const PAGE_BREAK: char = '\x0c';

/// Splits documents into overlapping word windows.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Fails with `InvalidArgument` if `chunk_size == 0` or `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::from_config(ChunkingConfig { chunk_size, overlap })
    }

    pub fn from_config(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Split `text` into chunks. Empty or whitespace-only text yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let words = paged_words(text);
        if words.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        let stride = self.config.stride();
        let mut chunks = Vec::with_capacity(self.estimate_chunks(words.len()));
        let mut start = 0usize;

        loop {
            let end = (start + size).min(words.len());
            let window = &words[start..end];
            let content = window
                .iter()
                .map(|(word, _)| *word)
                .collect::<Vec<_>>()
                .join(" ");
            chunks.push(Chunk::new(content, chunks.len()).with_page(window[0].1));

            if end == words.len() {
                break;
            }
            start += stride;
        }

        tracing::debug!(
            "Chunked {} words into {} chunks (size={}, overlap={})",
            words.len(),
            chunks.len(),
            size,
            self.config.overlap
        );
        chunks
    }

    /// Number of chunks a text of `word_count` words produces.
    pub fn estimate_chunks(&self, word_count: usize) -> usize {
        let size = self.config.chunk_size;
        if word_count == 0 {
            return 0;
        }
        if word_count <= size {
            return 1;
        }
        let stride = self.config.stride();
        1 + (word_count - size).div_ceil(stride)
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

/// Chunk `text` with explicit parameters.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(Chunker::new(chunk_size, overlap)?.chunk(text))
}

/// Words paired with their 1-based page, or page 0 when the text has no page breaks.
fn paged_words(text: &str) -> Vec<(&str, u32)> {
    if !text.contains(PAGE_BREAK) {
        return text.split_whitespace().map(|w| (w, 0)).collect();
    }
    text.split(PAGE_BREAK)
        .enumerate()
        .flat_map(|(i, page)| {
            let page_number = (i + 1) as u32;
            page.split_whitespace().map(move |w| (w, page_number))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::error::LecternError;

    const FOX: &str = "the quick brown fox jumps over the lazy dog";

    fn contents(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    #[test]
    fn test_fox_example() {
        let chunks = chunk_text(FOX, 4, 1).unwrap();
        assert_eq!(
            contents(&chunks),
            vec!["the quick brown fox", "fox jumps over the", "the lazy dog"]
        );
        let indices: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_text_gives_no_chunks() {
        assert!(chunk_text("", 500, 50).unwrap().is_empty());
        assert!(chunk_text("   \n\t  ", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn test_short_text_gives_one_chunk() {
        let chunks = chunk_text("just a few   words", 100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "just a few words");
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_exact_fit_gives_one_chunk() {
        let chunks = chunk_text("a b c d", 4, 2).unwrap();
        assert_eq!(contents(&chunks), vec!["a b c d"]);
    }

    #[test]
    fn test_invalid_overlap_is_rejected() {
        assert!(matches!(
            chunk_text(FOX, 5, 5),
            Err(LecternError::InvalidArgument(_))
        ));
        assert!(matches!(
            chunk_text(FOX, 5, 9),
            Err(LecternError::InvalidArgument(_))
        ));
        assert!(chunk_text(FOX, 0, 0).is_err());
    }

    #[test]
    fn test_punctuation_stays_attached() {
        let chunks = chunk_text("Hello, world! How are you?", 3, 0).unwrap();
        assert_eq!(contents(&chunks), vec!["Hello, world! How", "are you?"]);
    }

    #[test]
    fn test_deterministic() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        for (size, overlap) in [(3, 1), (4, 0), (5, 4), (12, 3), (20, 2)] {
            let a = chunk_text(text, size, overlap).unwrap();
            let b = chunk_text(text, size, overlap).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_overlap_invariant() {
        let text: String = (0..97).map(|i| format!("w{i} ")).collect();
        for (size, overlap) in [(4, 1), (5, 2), (10, 9), (7, 0), (30, 10)] {
            let chunks = chunk_text(&text, size, overlap).unwrap();
            for pair in chunks.windows(2) {
                let prev: Vec<&str> = pair[0].content.split(' ').collect();
                let next: Vec<&str> = pair[1].content.split(' ').collect();
                assert_eq!(prev.len(), size, "non-final chunks are full");
                assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
            }
        }
    }

    #[test]
    fn test_coverage_reconstructs_words() {
        let text = "one two three four five six seven eight nine ten eleven twelve thirteen";
        let original: Vec<&str> = text.split_whitespace().collect();
        for (size, overlap) in [(3, 1), (4, 2), (5, 0), (6, 5), (13, 3), (50, 10)] {
            let chunks = chunk_text(text, size, overlap).unwrap();
            let mut rebuilt: Vec<String> = Vec::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let skip = if i == 0 { 0 } else { overlap };
                rebuilt.extend(chunk.content.split(' ').skip(skip).map(String::from));
            }
            assert_eq!(rebuilt, original, "size={size} overlap={overlap}");
        }
    }

    #[test]
    fn test_estimate_matches_output() {
        let text: String = (0..53).map(|i| format!("t{i} ")).collect();
        for (size, overlap) in [(4, 1), (10, 3), (53, 5), (60, 0), (2, 1)] {
            let chunker = Chunker::new(size, overlap).unwrap();
            assert_eq!(chunker.estimate_chunks(53), chunker.chunk(&text).len());
        }
    }

    #[test]
    fn test_page_numbers_from_form_feeds() {
        let text = "a b c\x0cd e f\x0cg h";
        let chunks = chunk_text(text, 3, 1).unwrap();
        let pages: Vec<u32> = chunks.iter().map(|c| c.page_number).collect();
        // [a b c] [c d e] [e f g] [g h]
        assert_eq!(pages, vec![1, 1, 2, 3]);
        assert_eq!(chunks[1].content, "c d e");
    }

    #[test]
    fn test_page_unknown_without_form_feeds() {
        let chunks = chunk_text(FOX, 4, 1).unwrap();
        assert!(chunks.iter().all(|c| c.page_number == 0));
    }
}
