use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use paperchat_core::ChatTurn;

/// Incremental content tokens from one completion.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Sampling settings sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 1024,
        }
    }
}

/// A streaming chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Start a completion. `Ok` means the provider accepted the request and
    /// tokens can be read from the stream.
    async fn stream_chat(
        &self,
        turns: &[ChatTurn],
        params: &DecodingParams,
    ) -> Result<TokenStream, LlmError>;

    fn provider_name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("malformed response: {0}")]
    InvalidResponse(String),
    #[error("stream error: {0}")]
    StreamError(String),
}

impl LlmError {
    /// Whether the next provider should be tried. Only rate limiting, transport
    /// failures, and malformed responses qualify; other API errors mean the
    /// request itself was rejected.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited(_) | LlmError::NetworkError(_) | LlmError::InvalidResponse(_)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::RateLimited(_) => Some(429),
            LlmError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Scripted providers for exercising the fallback logic without a network.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use futures::stream;

    use super::*;

    pub enum Script {
        Tokens(Vec<String>),
        /// Tokens followed by a mid-stream error.
        Broken(Vec<String>, String),
        RateLimited,
        Network(String),
        Api(u16, String),
    }

    pub struct MockChatProvider {
        name: String,
        script: Script,
        calls: AtomicUsize,
        seen: Mutex<Vec<Vec<ChatTurn>>>,
    }

    impl MockChatProvider {
        pub fn new(name: &str, script: Script) -> Self {
            Self {
                name: name.to_string(),
                script,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn tokens(name: &str, tokens: &[&str]) -> Self {
            Self::new(name, Script::Tokens(tokens.iter().map(|t| t.to_string()).collect()))
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Turns received by each call, in call order.
        pub fn seen(&self) -> Vec<Vec<ChatTurn>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatProvider for MockChatProvider {
        async fn stream_chat(
            &self,
            turns: &[ChatTurn],
            _params: &DecodingParams,
        ) -> Result<TokenStream, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(turns.to_vec());
            match &self.script {
                Script::Tokens(tokens) => {
                    Ok(Box::pin(stream::iter(tokens.clone().into_iter().map(Ok))))
                }
                Script::Broken(tokens, error) => {
                    let items = tokens
                        .clone()
                        .into_iter()
                        .map(Ok)
                        .chain(std::iter::once(Err(LlmError::StreamError(error.clone()))))
                        .collect::<Vec<_>>();
                    Ok(Box::pin(stream::iter(items)))
                }
                Script::RateLimited => Err(LlmError::RateLimited("slow down".into())),
                Script::Network(msg) => Err(LlmError::NetworkError(msg.clone())),
                Script::Api(status, body) => Err(LlmError::ApiError {
                    status: *status,
                    message: body.clone(),
                }),
            }
        }

        fn provider_name(&self) -> &str {
            &self.name
        }
    }
}
