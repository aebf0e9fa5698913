//! Knowledge store and lexical retrieval.
//!
//! Loads a fixed set of text documents into addressable chunks at startup
//! (read-only thereafter) and scores chunks against queries with
//! IDF-weighted term overlap. Reloading requires constructing a new store,
//! which keeps concurrent reads lock-free.

pub mod retriever;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use retriever::Retriever;
pub use store::{ChunkPolicy, KnowledgeStore};
pub use types::{Document, KnowledgeChunk, RetrievalResult, ScoredChunk};
