use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use paperchat_core::Config;
use paperchat_ingest::{
    ChunkConfig, DocumentCache, DocumentService, Embedder, EmbeddingError, ExtractionError,
    PageSource, PageText,
};
use paperchat_llm::provider::mock::{MockChatProvider, Script};
use paperchat_llm::ChatProvider;

use super::*;

struct ThreePages;

#[async_trait]
impl PageSource for ThreePages {
    async fn pages(&self, _file_or_url: &str) -> Result<PageText, ExtractionError> {
        Ok(vec![
            "title page".into(),
            "method section words".into(),
            "results section words".into(),
        ])
    }
}

struct CountingEmbedder(AtomicUsize);

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }
}

fn config() -> Config {
    let mut config = Config::for_profile("PAPERCHAT_ROUTER_TEST");
    config.server.cors_origin = "*".into();
    config
}

fn app(documents: Option<Arc<DocumentService>>, providers: Vec<Arc<dyn ChatProvider>>) -> Router {
    build_router(Arc::new(AppState::new(config(), documents, providers)))
}

fn documents(embedder: Arc<CountingEmbedder>) -> Arc<DocumentService> {
    Arc::new(DocumentService::new(
        Arc::new(ThreePages),
        embedder,
        Arc::new(DocumentCache::new(4)),
        ChunkConfig::default(),
    ))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn chat_body(pdf_url: Option<&str>) -> Value {
    json!({
        "paper_title": "A Paper",
        "paper_abstract": "It does things.",
        "messages": [{"role": "user", "content": "What does it do?"}],
        "pdf_url": pdf_url,
    })
}

#[tokio::test]
async fn root_and_health() {
    let providers: Vec<Arc<dyn ChatProvider>> = vec![Arc::new(MockChatProvider::tokens("groq", &[]))];
    let app = app(None, providers);

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["message"].is_string());

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["embedding_ready"], false);
    assert_eq!(health["providers"], json!(["groq"]));
    assert_eq!(health["cached_documents"], 0);
}

#[tokio::test]
async fn resolves_arxiv_links() {
    let response = app(None, Vec::new())
        .oneshot(post_json("/resolve-pdf", json!({"url": "https://arxiv.org/abs/2301.00001v2"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "pdfLink": "https://arxiv.org/pdf/2301.00001v2.pdf",
            "source": "ARXIV_DIRECT",
            "sourceName": "Direct arXiv PDF Conversion",
        })
    );
}

#[tokio::test]
async fn process_without_embedder_is_unavailable() {
    let response = app(None, Vec::new())
        .oneshot(post_json("/process-pdf", json!({"pdf_url": "https://x/y.pdf"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["error"], "Embedding model not available");
}

#[tokio::test]
async fn process_reports_counts_and_caches() {
    let embedder = Arc::new(CountingEmbedder(AtomicUsize::new(0)));
    let app = app(Some(documents(embedder.clone())), Vec::new());

    let response = app
        .clone()
        .oneshot(post_json("/process-pdf", json!({"pdf_url": "https://x/y.pdf", "ignore_pages": "1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["processed_pages"], 2);
    assert_eq!(body["ignored_pages"], 1);
    assert_eq!(body["chunks_created"], 1);
    assert!(body["cache_key"].as_str().unwrap().starts_with("pdf_"));

    let response = app
        .oneshot(post_json("/process-pdf", json!({"pdf_url": "https://x/y.pdf"})))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["newly_processed"], false);
    assert_eq!(embedder.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn process_failure_is_bad_request() {
    let app = app(Some(documents(Arc::new(CountingEmbedder(AtomicUsize::new(0))))), Vec::new());
    let response = app
        .oneshot(post_json("/process-pdf", json!({"pdf_url": "https://x/y.pdf", "ignore_pages": "all"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "No valid pages to process after filtering"
    );
}

#[tokio::test]
async fn chat_streams_marker_then_tokens() {
    let providers: Vec<Arc<dyn ChatProvider>> = vec![
        Arc::new(MockChatProvider::new("openrouter", Script::RateLimited)),
        Arc::new(MockChatProvider::tokens("groq", &["It ", "does ", "things."])),
    ];
    let response = app(None, providers)
        .oneshot(post_json("/chat-with-ai", chat_body(None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(text, "[Chatting with abstract and title]\n\nIt does things.");
}

#[tokio::test]
async fn chat_grounds_on_processed_pdf() {
    let embedder = Arc::new(CountingEmbedder(AtomicUsize::new(0)));
    let providers: Vec<Arc<dyn ChatProvider>> =
        vec![Arc::new(MockChatProvider::tokens("openrouter", &["ok"]))];
    let response = app(Some(documents(embedder)), providers)
        .oneshot(post_json("/chat-with-ai", chat_body(Some("https://x/y.pdf"))))
        .await
        .unwrap();
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(text, "[Chatting with PDF content]\n\nok");
}

#[tokio::test]
async fn chat_without_keys_is_a_configuration_error() {
    let response = app(None, Vec::new())
        .oneshot(post_json("/chat-with-ai", chat_body(None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await["error"],
        "No API keys found in environment variables"
    );
}

#[tokio::test]
async fn chat_with_every_provider_down_is_bad_gateway() {
    let providers: Vec<Arc<dyn ChatProvider>> = vec![
        Arc::new(MockChatProvider::new("openrouter", Script::Network("refused".into()))),
        Arc::new(MockChatProvider::new("groq", Script::Network("timeout".into()))),
    ];
    let response = app(None, providers)
        .oneshot(post_json("/chat-with-ai", chat_body(None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("openrouter") && details.contains("groq"));
}

#[tokio::test]
async fn configured_cors_origin_is_echoed() {
    let mut config = config();
    config.server.cors_origin = "http://localhost:5173".into();
    let app = build_router(Arc::new(AppState::new(config, None, Vec::new())));

    let response = app
        .oneshot(
            Request::get("/")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
}
