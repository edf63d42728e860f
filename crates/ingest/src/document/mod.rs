pub mod chunker;
mod fetch;
pub mod ignore;
mod pdf;

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

pub use fetch::BROWSER_USER_AGENT;
pub use ignore::{parse_ignore_pages, IgnoreSet};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("URL does not return PDF content (content-type: {0})")]
    UnsupportedContent(String),
    #[error("No pages found in PDF")]
    EmptyDocument,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-page text of a PDF, index 0 = page 1. Pages that yielded no text are
/// kept as empty strings so page numbers stay aligned.
pub type PageText = Vec<String>;

/// Prepend `https://` to bare `www.` and `arxiv.org` references.
pub fn normalize_input_path(file_or_url: &str) -> String {
    let trimmed = file_or_url.trim();
    if trimmed.starts_with("www.") || trimmed.starts_with("arxiv.org") {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetches or reads a PDF and splits it into per-page text.
pub struct DocumentExtractor {
    client: reqwest::Client,
}

impl DocumentExtractor {
    pub fn new(fetch_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(fetch_timeout)
                .user_agent(BROWSER_USER_AGENT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Extract page text from a URL or local path.
    pub async fn extract(&self, file_or_url: &str) -> Result<PageText, ExtractionError> {
        let source = normalize_input_path(file_or_url);

        let bytes = if is_remote(&source) {
            fetch::fetch_pdf(&self.client, &source).await?
        } else {
            let path = Path::new(&source);
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(ExtractionError::NotFound(source));
            }
            debug!(path = %source, "reading local PDF");
            tokio::fs::read(path).await?
        };

        let pages = pdf::extract_pdf_pages(bytes).await?;
        if pages.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        info!(
            source = %source,
            pages = pages.len(),
            blank = pages.iter().filter(|p| p.is_empty()).count(),
            "extracted PDF text"
        );
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::testing::{pdf_bytes, serve_once};

    #[test]
    fn normalizes_bare_domains() {
        assert_eq!(
            normalize_input_path("  arxiv.org/pdf/2301.00001.pdf "),
            "https://arxiv.org/pdf/2301.00001.pdf"
        );
        assert_eq!(
            normalize_input_path("www.example.org/paper.pdf"),
            "https://www.example.org/paper.pdf"
        );
        assert_eq!(normalize_input_path("/tmp/paper.pdf"), "/tmp/paper.pdf");
        assert_eq!(
            normalize_input_path("http://example.org/a.pdf"),
            "http://example.org/a.pdf"
        );
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let extractor = DocumentExtractor::new(Duration::from_secs(1));
        let err = extractor
            .extract("/definitely/not/here/paper.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotFound(p) if p.ends_with("paper.pdf")));
    }

    fn temp_pdf(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[tokio::test]
    async fn local_pdf_yields_one_entry_per_page() {
        let file = temp_pdf(&pdf_bytes(&["Alpha first page", "Beta second page"]));
        let extractor = DocumentExtractor::new(Duration::from_secs(1));

        let pages = extractor.extract(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(pages, vec!["Alpha first page", "Beta second page"]);
        assert_eq!(parse_ignore_pages("2", pages.len()).len(), 1);
    }

    #[tokio::test]
    async fn garbage_local_file_is_a_pdf_error() {
        let file = temp_pdf(b"this is not a pdf");
        let extractor = DocumentExtractor::new(Duration::from_secs(1));
        let err = extractor.extract(file.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::PdfError(_)));
    }

    #[tokio::test]
    async fn pdf_without_pages_is_an_empty_document() {
        let file = temp_pdf(&pdf_bytes(&[]));
        let extractor = DocumentExtractor::new(Duration::from_secs(1));
        let err = extractor.extract(file.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyDocument));
    }

    #[tokio::test]
    async fn remote_pdf_is_downloaded_and_split() {
        let base = serve_once("200 OK", "application/pdf", pdf_bytes(&["One", "Two", "Three"])).await;
        let extractor = DocumentExtractor::new(Duration::from_secs(5));

        let pages = extractor.extract(&format!("{base}/paper.pdf")).await.unwrap();
        assert_eq!(pages, vec!["One", "Two", "Three"]);
    }

    #[tokio::test]
    async fn remote_html_is_unsupported_content() {
        let base = serve_once("200 OK", "text/html; charset=utf-8", b"<html></html>".to_vec()).await;
        let extractor = DocumentExtractor::new(Duration::from_secs(5));

        let err = extractor.extract(&format!("{base}/paper")).await.unwrap_err();
        assert!(matches!(&err, ExtractionError::UnsupportedContent(ct) if ct.starts_with("text/html")));
    }

    #[tokio::test]
    async fn remote_error_status_is_an_http_error() {
        let base = serve_once("404 Not Found", "text/plain", b"gone".to_vec()).await;
        let extractor = DocumentExtractor::new(Duration::from_secs(5));

        let err = extractor.extract(&format!("{base}/missing.pdf")).await.unwrap_err();
        assert!(matches!(&err, ExtractionError::Http(e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND)));
    }
}
