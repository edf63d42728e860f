//! PDF → pages → chunks → index, fronted by the document cache.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use paperchat_core::config::IngestConfig;

use crate::cache::{cache_key, DocumentCache};
use crate::document::chunker::{chunk_text, join_pages, ChunkConfig};
use crate::document::{parse_ignore_pages, DocumentExtractor, ExtractionError, PageText};
use crate::embedding::Embedder;
use crate::index::{build_index, DocumentIndex, DocumentMetadata, IndexError};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("No valid pages to process after filtering")]
    NoPagesAfterFiltering,
    #[error("No text chunks created")]
    NoChunks,
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Where page text comes from. The production source downloads and parses
/// PDFs; tests substitute canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn pages(&self, file_or_url: &str) -> Result<PageText, ExtractionError>;
}

#[async_trait]
impl PageSource for DocumentExtractor {
    async fn pages(&self, file_or_url: &str) -> Result<PageText, ExtractionError> {
        self.extract(file_or_url).await
    }
}

/// Summary returned to callers that asked for a document to be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedDocument {
    pub cache_key: String,
    pub total_pages: usize,
    pub processed_pages: usize,
    pub ignored_pages: usize,
    pub chunks_created: usize,
    /// False when the document was already cached.
    pub newly_processed: bool,
}

/// Builds and caches searchable documents.
pub struct DocumentService {
    source: Arc<dyn PageSource>,
    embedder: Arc<dyn Embedder>,
    cache: Arc<DocumentCache>,
    chunk_config: ChunkConfig,
}

impl DocumentService {
    pub fn new(
        source: Arc<dyn PageSource>,
        embedder: Arc<dyn Embedder>,
        cache: Arc<DocumentCache>,
        chunk_config: ChunkConfig,
    ) -> Self {
        Self {
            source,
            embedder,
            cache,
            chunk_config,
        }
    }

    /// Production wiring: HTTP/local PDF extraction with the configured limits.
    pub fn from_config(config: &IngestConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(
            Arc::new(DocumentExtractor::new(config.pdf_fetch_timeout())),
            embedder,
            Arc::new(DocumentCache::new(config.document_cache_capacity)),
            ChunkConfig {
                chunk_words: config.chunk_size_words,
                overlap_words: config.chunk_overlap_words,
            },
        )
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Return the cached index for `pdf_url`, processing it first if needed.
    ///
    /// The ignore directive only applies when the document is built; a cached
    /// entry is returned as-is.
    pub async fn ensure(
        &self,
        pdf_url: &str,
        ignore_pages: &str,
    ) -> Result<(String, Arc<DocumentIndex>, bool), ProcessError> {
        let key = cache_key(pdf_url);
        let lookup = self
            .cache
            .get_or_build(&key, || self.build(pdf_url, ignore_pages))
            .await?;
        if lookup.hit && !matches!(ignore_pages.trim().to_lowercase().as_str(), "" | "none") {
            warn!(key = %key, ignore = %ignore_pages, "document already cached; ignore directive not applied");
        }
        Ok((key, lookup.index, !lookup.hit))
    }

    /// `ensure` plus the summary shape returned by the processing endpoint.
    pub async fn process(
        &self,
        pdf_url: &str,
        ignore_pages: &str,
    ) -> Result<ProcessedDocument, ProcessError> {
        let (cache_key, index, newly_processed) = self.ensure(pdf_url, ignore_pages).await?;
        Ok(ProcessedDocument {
            cache_key,
            total_pages: index.metadata.total_pages,
            processed_pages: index.metadata.processed_pages,
            ignored_pages: index.metadata.ignored_pages,
            chunks_created: index.len(),
            newly_processed,
        })
    }

    async fn build(&self, pdf_url: &str, ignore_pages: &str) -> Result<DocumentIndex, ProcessError> {
        let pages = self.source.pages(pdf_url).await?;
        let total_pages = pages.len();
        if total_pages == 0 {
            return Err(ExtractionError::EmptyDocument.into());
        }

        let ignored = parse_ignore_pages(ignore_pages, total_pages);
        let (text, processed_pages) = join_pages(&pages, &ignored);
        if processed_pages == 0 {
            return Err(ProcessError::NoPagesAfterFiltering);
        }

        let chunks = chunk_text(&text, &self.chunk_config);
        if chunks.is_empty() {
            return Err(ProcessError::NoChunks);
        }

        let metadata = DocumentMetadata {
            total_pages,
            processed_pages,
            ignored_pages: ignored.len(),
        };
        let chunk_count = chunks.len();
        let index = build_index(chunks, &self.embedder, metadata).await?;

        info!(
            url = %pdf_url,
            total_pages,
            processed_pages,
            ignored_pages = ignored.len(),
            chunks = chunk_count,
            "processed document"
        );
        Ok(index)
    }
}
