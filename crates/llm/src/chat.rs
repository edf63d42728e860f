//! Chat orchestration: ground the conversation in the paper, then stream a
//! completion from the first provider that accepts it.
//!
//! Providers are tried in order. Rate limiting, transport failures, and
//! malformed responses move on to the next provider; any other rejection
//! from the first provider tried is returned as-is. Grounding never fails a
//! chat; it only decides which context mode is used.

use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use paperchat_core::chat::last_user_content;
use paperchat_core::{ChatTurn, Outcome, Role};
use paperchat_ingest::{retrieve, DocumentService};

use crate::prompt::{abstract_prompt, document_prompt, ContextMode};
use crate::provider::{ChatProvider, DecodingParams, LlmError, TokenStream};

/// Text chunks sent to the caller: the context-mode marker, then tokens.
pub type ChatStream = Pin<Box<dyn Stream<Item = String> + Send>>;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub paper_title: String,
    #[serde(default)]
    pub paper_abstract: String,
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatFailure {
    #[error("No API keys found in environment variables")]
    Configuration,
    #[error("{provider} failed: {source}")]
    Provider { provider: String, source: LlmError },
    #[error("All completion providers failed")]
    AllFailed { attempts: Vec<(String, LlmError)> },
}

impl ChatFailure {
    /// Human-readable cause, naming every provider that was tried.
    pub fn details(&self) -> String {
        match self {
            ChatFailure::Configuration => {
                "set OPENROUTER_API_KEY and/or GROQ_API_KEY".to_string()
            }
            ChatFailure::Provider { source, .. } => source.to_string(),
            ChatFailure::AllFailed { attempts } => attempts
                .iter()
                .map(|(name, err)| format!("{name}: {err}"))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

pub struct ChatOrchestrator {
    documents: Option<Arc<DocumentService>>,
    providers: Vec<Arc<dyn ChatProvider>>,
    params: DecodingParams,
    top_k: usize,
}

impl ChatOrchestrator {
    /// `documents` is `None` when no embedding model is available; chats
    /// then always use the abstract.
    pub fn new(
        documents: Option<Arc<DocumentService>>,
        providers: Vec<Arc<dyn ChatProvider>>,
        top_k: usize,
    ) -> Self {
        Self {
            documents,
            providers,
            params: DecodingParams::default(),
            top_k,
        }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    /// Retrieved PDF sections for the latest user turn, joined by blank lines.
    pub async fn ground(&self, request: &ChatRequest) -> Outcome<String> {
        let Some(pdf_url) = request
            .pdf_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        else {
            return Outcome::degraded("no PDF URL supplied");
        };
        let Some(documents) = &self.documents else {
            return Outcome::degraded("no embedding model configured");
        };

        let index = match documents.ensure(pdf_url, "none").await {
            Ok((_, index, _)) => index,
            Err(e) => {
                warn!(url = %pdf_url, error = %e, "PDF processing for chat failed");
                return Outcome::degraded(format!("document processing failed: {e}"));
            }
        };

        let Some(query) = last_user_content(&request.messages) else {
            return Outcome::degraded("no user turn to search with");
        };

        match retrieve(query, &index, documents.embedder().as_ref(), self.top_k).await {
            Outcome::Ok(chunks) if chunks.is_empty() => Outcome::degraded("no relevant sections"),
            Outcome::Ok(chunks) => Outcome::Ok(
                chunks
                    .iter()
                    .map(|c| c.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
            Outcome::Degraded(reason) => Outcome::Degraded(reason),
        }
    }

    /// The system turn for the chosen mode followed by the caller's
    /// user/assistant turns. Caller system turns are dropped.
    pub async fn build_turns(&self, request: &ChatRequest) -> (ContextMode, Vec<ChatTurn>) {
        let (mode, system) = match self.ground(request).await {
            Outcome::Ok(context) => (
                ContextMode::Document,
                document_prompt(&request.paper_title, &context),
            ),
            Outcome::Degraded(reason) => {
                debug!(reason = %reason, "chatting without PDF grounding");
                (
                    ContextMode::Abstract,
                    abstract_prompt(&request.paper_title, &request.paper_abstract),
                )
            }
        };

        let turns = std::iter::once(ChatTurn::system(system))
            .chain(
                request
                    .messages
                    .iter()
                    .filter(|t| t.role != Role::System)
                    .cloned(),
            )
            .collect();
        (mode, turns)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatStream, ChatFailure> {
        if self.providers.is_empty() {
            return Err(ChatFailure::Configuration);
        }

        let (mode, turns) = self.build_turns(request).await;
        let mut attempts: Vec<(String, LlmError)> = Vec::new();

        for provider in &self.providers {
            let name = provider.provider_name().to_string();
            match provider.stream_chat(&turns, &self.params).await {
                Ok(tokens) => {
                    info!(provider = %name, mode = mode.label(), fallbacks = attempts.len(), "streaming completion");
                    return Ok(relay(mode, name, tokens));
                }
                Err(e) if e.triggers_fallback() => {
                    warn!(provider = %name, error = %e, "provider unavailable; trying next");
                    attempts.push((name, e));
                }
                Err(e) if attempts.is_empty() => {
                    warn!(provider = %name, error = %e, "provider rejected request");
                    return Err(ChatFailure::Provider {
                        provider: name,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(provider = %name, error = %e, "fallback provider failed");
                    attempts.push((name, e));
                }
            }
        }

        Err(ChatFailure::AllFailed { attempts })
    }
}

/// Marker first, then tokens until the provider stream ends or fails.
fn relay(mode: ContextMode, provider: String, tokens: TokenStream) -> ChatStream {
    let body = stream::unfold((tokens, provider), |(mut tokens, provider)| async move {
        match tokens.next().await {
            Some(Ok(token)) => Some((token, (tokens, provider))),
            Some(Err(e)) => {
                warn!(provider = %provider, error = %e, "completion stream ended early");
                None
            }
            None => None,
        }
    });
    Box::pin(stream::once(async move { mode.marker() }).chain(body))
}
