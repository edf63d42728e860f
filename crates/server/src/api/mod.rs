//! Endpoint handlers, one module per concern.

mod chat;
mod documents;
mod health;
mod resolve;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub use chat::chat_with_ai;
pub use documents::process_pdf;
pub use health::{health, root};
pub use resolve::resolve_pdf;
