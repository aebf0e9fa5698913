//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// A source document handed to the store at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identifier (typically the file name)
    pub id: String,

    /// Full document text
    pub text: String,
}

/// A bounded unit of document text used as the unit of retrieval.
///
/// Chunks are created once at load time and never mutated. They never cross
/// document boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier (`<doc>#<ordinal>`)
    pub id: String,

    /// Identifier of the document this chunk came from
    pub source_doc_id: String,

    /// Whitespace-normalized text content
    pub text: String,

    /// Position within the source document, used for stable tie-breaking
    pub ordinal: u32,
}

/// A chunk reference with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// Chunk identifier
    pub chunk_id: String,

    /// IDF-weighted overlap score, higher is more relevant
    pub score: f32,
}

/// Ordered retrieval output, relevance-descending, length at most K.
///
/// Produced per query and not persisted. An empty result is a normal
/// outcome meaning "answer from general knowledge only", never a failure.
pub type RetrievalResult = Vec<ScoredChunk>;
