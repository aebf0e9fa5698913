//! Immutable knowledge store with boundary-aware chunking.
//!
//! Documents are split on paragraph boundaries, whitespace-normalized, and
//! windowed to a maximum length. The chunk set is fixed after `load`; there
//! is no mutation API, so concurrent readers need no locking.

use std::collections::HashMap;
use std::path::Path;

use advisor_core::{AppError, AppResult};
use walkdir::WalkDir;

use crate::types::{Document, KnowledgeChunk};

/// Chunking policy applied at load time.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPolicy {
    /// Maximum chunk length in characters; longer paragraphs are windowed
    pub max_chunk_len: usize,

    /// Paragraphs (and window tails) shorter than this are skipped
    pub min_chunk_len: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            max_chunk_len: 900,
            min_chunk_len: 80,
        }
    }
}

/// Read-only store of knowledge chunks.
#[derive(Debug)]
pub struct KnowledgeStore {
    chunks: Vec<KnowledgeChunk>,
    by_id: HashMap<String, usize>,
    doc_count: usize,
}

impl KnowledgeStore {
    /// Build a store from already-read documents.
    ///
    /// Fails when a document produces no chunks under the policy: an empty
    /// or all-boilerplate document in the curated set is a configuration
    /// mistake, not a condition to paper over.
    pub fn load(documents: Vec<Document>, policy: ChunkPolicy) -> AppResult<Self> {
        let mut chunks = Vec::new();
        let doc_count = documents.len();

        for document in &documents {
            let doc_chunks = chunk_document(document, policy);
            if doc_chunks.is_empty() {
                return Err(AppError::Knowledge(format!(
                    "Document '{}' is empty after chunking (min length {})",
                    document.id, policy.min_chunk_len
                )));
            }
            chunks.extend(doc_chunks);
        }

        let by_id = chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| (chunk.id.clone(), idx))
            .collect();

        tracing::info!(
            "Knowledge store loaded: {} documents, {} chunks",
            doc_count,
            chunks.len()
        );

        Ok(Self {
            chunks,
            by_id,
            doc_count,
        })
    }

    /// Build a store from every `.md` and `.txt` file under a directory.
    ///
    /// Files are visited in sorted order so chunk ordinals are reproducible
    /// across runs. Unreadable files fail the load.
    pub fn from_dir(dir: &Path, policy: ChunkPolicy) -> AppResult<Self> {
        if !dir.is_dir() {
            return Err(AppError::Knowledge(format!(
                "Knowledge directory does not exist: {:?}",
                dir
            )));
        }

        let mut paths: Vec<_> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path().is_file()
                    && matches!(
                        e.path().extension().and_then(|x| x.to_str()),
                        Some("md") | Some("txt")
                    )
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                AppError::Knowledge(format!("Failed to read document {:?}: {}", path, e))
            })?;
            let id = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string());
            documents.push(Document { id, text });
        }

        if documents.is_empty() {
            return Err(AppError::Knowledge(format!(
                "No knowledge documents found under {:?}",
                dir
            )));
        }

        Self::load(documents, policy)
    }

    /// All chunks in load order.
    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    /// Chunks belonging to one document, ordinal-ascending.
    pub fn chunks_of(&self, doc_id: &str) -> Vec<&KnowledgeChunk> {
        self.chunks
            .iter()
            .filter(|c| c.source_doc_id == doc_id)
            .collect()
    }

    /// Look up a chunk by id.
    pub fn get(&self, chunk_id: &str) -> Option<&KnowledgeChunk> {
        self.by_id.get(chunk_id).map(|&idx| &self.chunks[idx])
    }

    /// Number of chunks held.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of source documents.
    pub fn doc_count(&self) -> usize {
        self.doc_count
    }
}

/// Chunk a single document under the policy.
fn chunk_document(document: &Document, policy: ChunkPolicy) -> Vec<KnowledgeChunk> {
    let mut chunks = Vec::new();
    let mut ordinal = 0u32;

    for paragraph in split_paragraphs(&document.text) {
        let normalized = normalize_whitespace(&paragraph);
        if normalized.chars().count() < policy.min_chunk_len {
            continue;
        }

        for segment in window_chars(&normalized, policy.max_chunk_len) {
            let segment = segment.trim();
            if segment.chars().count() < policy.min_chunk_len {
                continue;
            }
            chunks.push(KnowledgeChunk {
                id: format!("{}#{}", document.id, ordinal),
                source_doc_id: document.id.clone(),
                text: segment.to_string(),
                ordinal,
            });
            ordinal += 1;
        }
    }

    chunks
}

/// Split text on blank-line paragraph boundaries.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Collapse all whitespace runs to single spaces.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Window a string into segments of at most `max_len` characters.
fn window_chars(text: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_len.max(1))
        .map(|c| c.iter().collect())
        .collect()
}
