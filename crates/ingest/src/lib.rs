pub mod cache;
pub mod document;
pub mod embedding;
pub mod index;
pub mod pipeline;
pub mod resolver;
pub mod retriever;

#[cfg(test)]
mod testing;

pub use cache::{cache_key, DocumentCache};
pub use document::chunker::{Chunk, ChunkConfig};
pub use document::{DocumentExtractor, ExtractionError, PageText};
pub use embedding::{create_embedder, Embedder, EmbeddingError};
pub use index::{DocumentIndex, DocumentMetadata, IndexError};
pub use pipeline::{DocumentService, PageSource, ProcessError, ProcessedDocument};
pub use resolver::{LinkSource, PdfLinkResolver, ResolvedLink};
pub use retriever::{retrieve, DEFAULT_TOP_K};
