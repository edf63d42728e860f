use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub providers: ProviderConfig,
    pub embedding: EmbeddingConfig,
    pub ingest: IngestConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PAPERCHAT_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("PAPERCHAT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            providers: ProviderConfig::from_env_profiled(p),
            embedding: EmbeddingConfig::from_env_profiled(p),
            ingest: IngestConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{} cors={}", self.server.host, self.server.port, self.server.cors_origin);
        tracing::info!(
            "  providers:   openrouter={} groq={}",
            self.providers.openrouter_api_key.is_some(),
            self.providers.groq_api_key.is_some()
        );
        tracing::info!(
            "  embedding:   provider={} model={} dims={}",
            self.embedding.provider, self.embedding.model, self.embedding.dimensions
        );
        tracing::info!(
            "  ingest:      chunk={}/{} top_k={} cache={}",
            self.ingest.chunk_size_words,
            self.ingest.chunk_overlap_words,
            self.ingest.retrieval_top_k,
            self.ingest.document_cache_capacity
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Completion providers (OpenRouter primary, Groq secondary) ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub openrouter_base_url: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_base_url: String,
    pub connect_timeout_secs: u64,
    /// Longest silence tolerated between two frames of an upstream stream.
    pub idle_timeout_secs: u64,
}

impl ProviderConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            openrouter_api_key: profiled_env_opt(p, "OPENROUTER_API_KEY"),
            openrouter_model: profiled_env_or(p, "OPENROUTER_MODEL", "meta-llama/llama-4-maverick:free"),
            openrouter_base_url: profiled_env_or(p, "OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
            groq_api_key: profiled_env_opt(p, "GROQ_API_KEY"),
            groq_model: profiled_env_or(p, "GROQ_MODEL", "meta-llama/llama-4-scout-17b-16e-instruct"),
            groq_base_url: profiled_env_or(p, "GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
            connect_timeout_secs: profiled_env_parse(p, "PROVIDER_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: profiled_env_parse(p, "PROVIDER_IDLE_TIMEOUT_SECS", 120),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.openrouter_api_key.is_some() || self.groq_api_key.is_some()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama", "openai", or "none"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub ollama_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "EMBEDDING_PROVIDER", "ollama"),
            model: profiled_env_or(p, "EMBEDDING_MODEL", "nomic-embed-text"),
            dimensions: profiled_env_parse(p, "EMBEDDING_DIMENSIONS", 768),
            ollama_url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            timeout_secs: profiled_env_parse(p, "EMBEDDING_TIMEOUT_SECS", 60),
        }
    }

    /// Per-request limit for embedding calls, including query embeddings at chat time.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Ingest / retrieval ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub chunk_size_words: usize,
    pub chunk_overlap_words: usize,
    pub retrieval_top_k: usize,
    pub pdf_fetch_timeout_secs: u64,
    pub scrape_timeout_secs: u64,
    pub document_cache_capacity: usize,
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            chunk_size_words: profiled_env_parse(p, "CHUNK_SIZE_WORDS", 400),
            chunk_overlap_words: profiled_env_parse(p, "CHUNK_OVERLAP_WORDS", 60),
            retrieval_top_k: profiled_env_parse(p, "RETRIEVAL_TOP_K", 8),
            pdf_fetch_timeout_secs: profiled_env_parse(p, "PDF_FETCH_TIMEOUT_SECS", 30),
            scrape_timeout_secs: profiled_env_parse(p, "SCRAPE_TIMEOUT_SECS", 10),
            document_cache_capacity: profiled_env_parse(p, "DOCUMENT_CACHE_CAPACITY", 64),
        }
    }

    pub fn pdf_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_fetch_timeout_secs)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size_words: 400,
            chunk_overlap_words: 60,
            retrieval_top_k: 8,
            pdf_fetch_timeout_secs: 30,
            scrape_timeout_secs: 10,
            document_cache_capacity: 64,
        }
    }
}
