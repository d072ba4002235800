//! # Lectern Knowledge
//!
//! Retrieval core for study documents: no vector DB, no embeddings.
//!
//! ## Design
//! - **Chunking**: split extracted text into overlapping word windows (500/50)
//! - **Lexical scoring**: distinct query terms found in each chunk (BM25 optional)
//! - **Top-K selection**: score descending, ties by chunk position
//! - **Background ingest**: extraction runs off the request path
//!
//! ## How it works
//! ```text
//! Student: "What does mitochondria produce?"
//!   ↓
//! Retriever.retrieve(document.chunks, question)
//!   ↓ lexical overlap
//! Top 3 chunks from the document
//!   ↓
//! Injected into the prompt as context
//!   ↓
//! Provider answers, citing chunk indices
//! ```

pub mod chunker;
pub mod extract;
pub mod ingest;
pub mod search;

pub use chunker::{Chunker, chunk_text};
pub use extract::{PdfTextExtractor, PlainTextExtractor, TextExtractor, extractor_for};
pub use ingest::{Ingestor, RetryPolicy};
pub use search::{Bm25Scorer, LexicalScorer, Retriever, Scorer, retrieve, scorer_for, select_top_k};
