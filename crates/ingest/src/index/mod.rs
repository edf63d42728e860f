//! Chunk embedding and nearest-neighbor indexing.

mod flat;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::document::chunker::Chunk;
use crate::embedding::{Embedder, EmbeddingError};

pub use flat::FlatL2Index;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No text chunks to index")]
    NoContent,
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Nearest-neighbor lookup over fixed-dimension vectors. Vector ids are
/// assigned in insertion order starting at 0.
pub trait NearestNeighborIndex: Send + Sync {
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError>;

    /// Up to `k` `(id, distance)` pairs in increasing-distance order.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError>;

    fn len(&self) -> usize;

    fn dimensions(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Page accounting for a processed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentMetadata {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub ignored_pages: usize,
}

/// An immutable, searchable document: the index, the embeddings it was
/// built from, and the chunks they belong to (chunk `i` = vector id `i`).
pub struct DocumentIndex {
    index: Box<dyn NearestNeighborIndex>,
    embeddings: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
    pub metadata: DocumentMetadata,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("chunks", &self.chunks.len())
            .field("dimensions", &self.index.dimensions())
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl DocumentIndex {
    /// Assemble from parts. `index` must already hold one vector per chunk.
    pub fn from_parts(
        index: Box<dyn NearestNeighborIndex>,
        embeddings: Vec<Vec<f32>>,
        chunks: Vec<Chunk>,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            index,
            embeddings,
            chunks,
            metadata,
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn index(&self) -> &dyn NearestNeighborIndex {
        self.index.as_ref()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Embed all chunks in one batch and build a flat L2 index over them.
pub async fn build_index(
    chunks: Vec<Chunk>,
    embedder: &Arc<dyn Embedder>,
    metadata: DocumentMetadata,
) -> Result<DocumentIndex, IndexError> {
    if chunks.is_empty() {
        return Err(IndexError::NoContent);
    }

    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    debug!(chunks = texts.len(), "embedding document chunks");
    let embeddings = embedder.embed_batch(&texts).await?;

    let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
    if dimensions != embedder.dimensions() {
        return Err(IndexError::DimensionMismatch {
            expected: embedder.dimensions(),
            actual: dimensions,
        });
    }

    let mut index = FlatL2Index::new(dimensions);
    index.add(&embeddings)?;
    if index.len() != chunks.len() {
        return Err(IndexError::Embedding(EmbeddingError::CountMismatch {
            expected: chunks.len(),
            actual: index.len(),
        }));
    }

    info!(chunks = chunks.len(), dimensions, "built document index");
    Ok(DocumentIndex::from_parts(
        Box::new(index),
        embeddings,
        chunks,
        metadata,
    ))
}
