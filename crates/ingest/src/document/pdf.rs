use std::panic::{catch_unwind, AssertUnwindSafe};

use pdf_extract::{Document, OutputError, PlainTextOutput};
use tracing::warn;

use super::{ExtractionError, PageText};

/// Parse PDF bytes on the blocking pool, one text entry per page.
pub(super) async fn extract_pdf_pages(bytes: Vec<u8>) -> Result<PageText, ExtractionError> {
    tokio::task::spawn_blocking(move || pages_from_bytes(&bytes))
        .await
        .map_err(|e| ExtractionError::PdfError(format!("PDF parser aborted: {e}")))?
}

fn pages_from_bytes(bytes: &[u8]) -> Result<PageText, ExtractionError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| ExtractionError::PdfError(e.to_string()))?;
    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|e| ExtractionError::PdfError(format!("encrypted PDF: {e}")))?;
    }

    Ok(doc
        .get_pages()
        .keys()
        .map(|&page_num| page_text(&doc, page_num))
        .collect())
}

/// Text of one page, or an empty string if the page cannot be rendered.
/// pdf-extract panics on some malformed pages, so each page runs isolated.
fn page_text(doc: &Document, page_num: u32) -> String {
    let rendered = catch_unwind(AssertUnwindSafe(|| {
        let mut text = String::new();
        {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(doc, &mut output, page_num)?;
        }
        Ok::<_, OutputError>(text)
    }));

    match rendered {
        Ok(Ok(text)) => clean_page(page_num, &text),
        Ok(Err(e)) => {
            warn!(page = page_num, error = %e, "failed to extract text from page, substituting empty text");
            String::new()
        }
        Err(_) => {
            warn!(page = page_num, "PDF parser panicked on page, substituting empty text");
            String::new()
        }
    }
}

/// Trim page text; a page whose text did not decode is logged and blanked.
fn clean_page(page_num: u32, text: &str) -> String {
    let text = text.trim();
    if is_undecodable(text) {
        warn!(page = page_num, "page text did not decode, substituting empty text");
        String::new()
    } else {
        text.to_string()
    }
}

/// Text made mostly of replacement characters is a failed font decode.
fn is_undecodable(page: &str) -> bool {
    let total = page.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return false;
    }
    let replaced = page.chars().filter(|&c| c == '\u{FFFD}').count();
    replaced * 2 > total
}
