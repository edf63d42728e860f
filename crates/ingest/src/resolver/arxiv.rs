//! arXiv abstract/PDF URL recognition.

use std::sync::LazyLock;

use regex::Regex;

static ARXIV_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^https?://(?:www\.|export\.)?arxiv\.org/(?:abs|pdf)/",
        r"((?:[a-z\-]+(?:\.[A-Za-z]{2})?/)?\d{4,7}(?:\.\d{4,5})?(?:v\d+)?)",
        r"(?:\.pdf)?/?(?:[?#].*)?$",
    ))
    .expect("arXiv URL pattern is valid")
});

/// The arXiv identifier in an abstract or PDF URL, version suffix included.
pub fn arxiv_id(url: &str) -> Option<&str> {
    ARXIV_URL
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Canonical `https://arxiv.org/pdf/<id>.pdf` for an arXiv URL.
pub fn arxiv_pdf_url(url: &str) -> Option<String> {
    arxiv_id(url).map(|id| format!("https://arxiv.org/pdf/{id}.pdf"))
}
