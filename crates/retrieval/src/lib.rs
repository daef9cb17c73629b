//! # Crabdesk Retrieval
//!
//! Lexical retrieval over the support document corpus: a markdown-aware
//! chunk segmenter, a substring-overlap scorer, and the `DocumentSource`
//! trait with a filesystem implementation.
//!
//! The index is built once at startup and shared immutably. There are no
//! embeddings here; scoring is token containment with title boosts, which
//! is enough for a small curated doc set.

pub mod chunker;
pub mod retriever;
pub mod source;

pub use chunker::{Chunk, chunk_all, chunk_document};
pub use retriever::{DEFAULT_TOP_K, Retriever};
pub use source::{DocumentSource, FsDocumentSource};
