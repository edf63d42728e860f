pub mod chat;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use chat::{ChatFailure, ChatOrchestrator, ChatRequest, ChatStream};
pub use prompt::ContextMode;
pub use provider::{ChatProvider, DecodingParams, LlmError, TokenStream};
pub use providers::create_providers;
