use tracing::debug;

use super::ExtractionError;

/// Some publishers refuse non-browser clients outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

pub(super) fn is_pdf_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("pdf")
}

/// GET a remote PDF, rejecting responses that are not PDF content.
pub(super) async fn fetch_pdf(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, ExtractionError> {
    debug!(url = %url, "fetching remote PDF");

    let response = client.get(url).send().await?.error_for_status()?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !is_pdf_content_type(&content_type) {
        return Err(ExtractionError::UnsupportedContent(content_type));
    }

    let bytes = response.bytes().await?;
    debug!(url = %url, bytes = bytes.len(), "downloaded PDF");
    Ok(bytes.to_vec())
}
