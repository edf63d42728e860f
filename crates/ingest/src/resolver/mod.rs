//! Turns a paper reference (landing page, abstract page, bare domain) into
//! a direct PDF link. Resolution never fails; unresolvable input comes back
//! unchanged with a source tag saying why.

mod arxiv;
mod scrape;

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::document::BROWSER_USER_AGENT;

pub use arxiv::{arxiv_id, arxiv_pdf_url};
pub use scrape::resolve_from_html;

static SEMANTIC_SCHOLAR_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"semanticscholar\.org/paper/(?:.*?/)?([a-f0-9]{40})")
        .expect("Semantic Scholar id pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkSource {
    ArxivDirect,
    SemanticScrape,
    OriginalUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
    pub pdf_link: String,
    pub source: LinkSource,
    pub source_name: String,
}

impl ResolvedLink {
    pub fn new(pdf_link: impl Into<String>, source: LinkSource, source_name: &str) -> Self {
        Self {
            pdf_link: pdf_link.into(),
            source,
            source_name: source_name.to_string(),
        }
    }
}

/// Prepend `https://` to scheme-less input.
pub fn with_scheme(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

/// Semantic Scholar's 40-hex-digit paper id, if the URL carries one.
pub fn semantic_scholar_id(url: &str) -> Option<&str> {
    SEMANTIC_SCHOLAR_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn is_semantic_scholar(url: &str) -> bool {
    url.contains("semanticscholar.org")
}

pub struct PdfLinkResolver {
    client: reqwest::Client,
}

impl PdfLinkResolver {
    pub fn new(scrape_timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        Self {
            client: reqwest::Client::builder()
                .timeout(scrape_timeout)
                .user_agent(BROWSER_USER_AGENT)
                .default_headers(headers)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub async fn resolve(&self, raw: &str) -> ResolvedLink {
        let url = with_scheme(raw);

        if let Some(pdf) = arxiv_pdf_url(&url) {
            debug!(url = %url, pdf = %pdf, "resolved arXiv URL");
            return ResolvedLink::new(pdf, LinkSource::ArxivDirect, "Direct arXiv PDF Conversion");
        }

        if is_semantic_scholar(&url) {
            return match self.scrape(&url).await {
                Ok(link) => link,
                Err(e) => {
                    warn!(url = %url, error = %e, "Semantic Scholar scraping failed");
                    ResolvedLink::new(url, LinkSource::OriginalUrl, "Original URL (scraping failed)")
                }
            };
        }

        debug!(url = %url, "no resolver for host");
        ResolvedLink::new(url, LinkSource::OriginalUrl, "Original URL (unrecognized host)")
    }

    async fn scrape(&self, url: &str) -> Result<ResolvedLink, reqwest::Error> {
        if let Some(id) = semantic_scholar_id(url) {
            info!(paper_id = %id, "scraping Semantic Scholar paper page");
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url: Url = response.url().clone();
        let html = response.text().await?;

        let link = resolve_from_html(&html, &final_url, url);
        info!(url = %url, pdf = %link.pdf_link, source = %link.source_name, "scraped landing page");
        Ok(link)
    }
}
