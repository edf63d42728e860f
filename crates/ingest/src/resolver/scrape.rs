//! PDF link discovery in a scraped landing page.

use scraper::{Html, Selector};
use url::Url;

use super::{LinkSource, ResolvedLink};

fn looks_like_pdf(link: &str) -> bool {
    link.to_lowercase().ends_with(".pdf") || link.contains("arxiv.org/pdf")
}

fn absolutize(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(String::from)
}

/// Run the link chain over `html`: `citation_pdf_url` meta tag, then the first
/// PDF-looking anchor, then a non-PDF meta link, then `original_url`.
/// Relative links are resolved against `base` (the page's final URL).
pub fn resolve_from_html(html: &str, base: &Url, original_url: &str) -> ResolvedLink {
    let document = Html::parse_document(html);

    let mut non_pdf_fallback = None;
    if let Ok(meta) = Selector::parse("meta[name][content]") {
        let citation = document.select(&meta).find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("citation_pdf_url"))
        });
        let link = citation
            .and_then(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .and_then(|c| absolutize(base, c));
        if let Some(link) = link {
            if looks_like_pdf(&link) {
                return ResolvedLink::new(
                    link,
                    LinkSource::SemanticScrape,
                    "Semantic Scholar Scraping (citation_pdf_url)",
                );
            }
            non_pdf_fallback = Some(link);
        }
    }

    if let Ok(anchors) = Selector::parse("a[href]") {
        let found = document
            .select(&anchors)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| absolutize(base, href))
            .find(|link| looks_like_pdf(link));
        if let Some(link) = found {
            return ResolvedLink::new(
                link,
                LinkSource::SemanticScrape,
                "Semantic Scholar Scraping (generic scan)",
            );
        }
    }

    match non_pdf_fallback {
        Some(link) => ResolvedLink::new(
            link,
            LinkSource::SemanticScrape,
            "Semantic Scholar Scraping (non-pdf fallback)",
        ),
        None => ResolvedLink::new(
            original_url,
            LinkSource::OriginalUrl,
            "Original URL (no PDF found)",
        ),
    }
}
