//! Semantic search over crawled documentation snippets.
//!
//! This module turns text into vectors with fastembed and ranks stored
//! vectors against a query with in-memory cosine similarity.
//!
//! # Architecture
//!
//! - `embeddings`: wraps fastembed for embedding generation
//! - `service`: batching, pacing, and lazy model initialization
//! - `index`: immutable in-memory vector index with cosine similarity
//! - `preprocess`: text normalization and embedding-input hygiene

pub mod embeddings;
mod index;
mod preprocess;
mod service;

pub use index::SearchIndex;
pub use preprocess::{normalize_text, prepare_for_embedding};
pub use service::EmbeddingService;

/// Default embedding model (matches the original index's encoder family)
pub const DEFAULT_MODEL: &str = "bge-small-en-v1.5";
