//! OpenAI-compatible `chat/completions` streaming: response classification
//! and SSE frame decoding shared by every provider.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::provider::{LlmError, TokenStream};

/// One decoded `data:` line.
#[derive(Debug, PartialEq)]
pub(crate) enum Frame {
    Token(String),
    Done,
    /// Comment, keep-alive, empty delta, or undecodable payload.
    Skip,
    Error(String),
}

pub(crate) fn parse_line(line: &str) -> Frame {
    let Some(data) = line.strip_prefix("data:") else {
        return Frame::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Frame::Done;
    }

    let Ok(parsed) = serde_json::from_str::<Value>(data) else {
        trace!(data = %data, "skipping undecodable frame");
        return Frame::Skip;
    };

    if let Some(error) = parsed.get("error") {
        let message = error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Frame::Error(message);
    }

    match parsed["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => Frame::Token(content.to_string()),
        _ => Frame::Skip,
    }
}

/// Map a non-success status to an error. 429 is the fallback signal.
pub(crate) fn status_error(status: u16, body: String) -> LlmError {
    if status == 429 {
        LlmError::RateLimited(body)
    } else {
        LlmError::ApiError {
            status,
            message: body,
        }
    }
}

/// Send a streaming request and hand back its token stream once the
/// provider has accepted it.
pub(crate) async fn open_stream(
    request: reqwest::RequestBuilder,
    provider: &str,
    idle_timeout: Duration,
) -> Result<TokenStream, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(provider, status = status.as_u16(), "provider rejected request");
        return Err(status_error(status.as_u16(), body));
    }

    let is_json = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::InvalidResponse(format!(
            "expected an event stream, got JSON: {body}"
        )));
    }

    Ok(token_stream(response.bytes_stream(), idle_timeout))
}

/// Decode an SSE byte stream into content tokens.
///
/// Ends after `[DONE]` or end of body. An error frame, a transport error, or
/// `idle_timeout` without a new chunk yields one `Err` and then ends.
pub(crate) fn token_stream<S, E>(bytes: S, idle_timeout: Duration) -> TokenStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    type ByteStream<E> = Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send>>;

    struct State<E> {
        bytes: ByteStream<E>,
        buffer: Vec<u8>,
        pending: std::collections::VecDeque<String>,
        finished: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        buffer: Vec::new(),
        pending: Default::default(),
        finished: false,
    };

    let tokens = stream::unfold(state, move |mut state| async move {
        loop {
            if let Some(token) = state.pending.pop_front() {
                return Some((Ok(token), state));
            }
            if state.finished {
                return None;
            }

            let next = match tokio::time::timeout(idle_timeout, state.bytes.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(?idle_timeout, "provider stream idle; closing");
                    state.finished = true;
                    let err = LlmError::StreamError("idle timeout".into());
                    return Some((Err(err), state));
                }
            };

            match next {
                Some(Ok(chunk)) => {
                    // Split on raw bytes so multi-byte characters may straddle chunks.
                    state.buffer.extend_from_slice(&chunk);
                    while let Some(newline_pos) = state.buffer.iter().position(|b| *b == b'\n') {
                        let raw: Vec<u8> = state.buffer.drain(..=newline_pos).collect();
                        let line = String::from_utf8_lossy(&raw);

                        match parse_line(line.trim_end()) {
                            Frame::Token(token) => state.pending.push_back(token),
                            Frame::Skip => {}
                            Frame::Done => {
                                state.finished = true;
                                break;
                            }
                            Frame::Error(message) => {
                                state.finished = true;
                                if state.pending.is_empty() {
                                    return Some((Err(LlmError::StreamError(message)), state));
                                }
                                // Deliver what arrived before the error frame.
                                warn!(error = %message, "provider sent an error frame");
                                break;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let err = LlmError::NetworkError(e.to_string());
                    if state.pending.is_empty() {
                        return Some((Err(err), state));
                    }
                    warn!(error = %err, "provider stream broke");
                }
                None => {
                    state.finished = true;
                    let rest = String::from_utf8_lossy(&state.buffer).into_owned();
                    if let Frame::Token(token) = parse_line(rest.trim_end()) {
                        state.pending.push_back(token);
                    }
                    state.buffer.clear();
                }
            }
        }
    });

    Box::pin(tokens)
}
