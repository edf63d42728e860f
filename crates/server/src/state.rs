use std::sync::Arc;

use tracing::{info, warn};

use paperchat_core::Config;
use paperchat_ingest::{create_embedder, DocumentService, PdfLinkResolver};
use paperchat_llm::{create_providers, ChatOrchestrator, ChatProvider};

pub struct AppState {
    pub config: Config,
    pub resolver: PdfLinkResolver,
    /// `None` without an embedding backend; processing is then unavailable.
    pub documents: Option<Arc<DocumentService>>,
    pub chat: ChatOrchestrator,
}

impl AppState {
    pub fn new(
        config: Config,
        documents: Option<Arc<DocumentService>>,
        providers: Vec<Arc<dyn ChatProvider>>,
    ) -> Self {
        let resolver = PdfLinkResolver::new(config.ingest.scrape_timeout());
        let chat = ChatOrchestrator::new(documents.clone(), providers, config.ingest.retrieval_top_k);
        Self {
            config,
            resolver,
            documents,
            chat,
        }
    }

    /// Wire real collaborators from configuration.
    pub fn from_config(config: Config) -> Self {
        let documents = match create_embedder(&config.embedding) {
            Some(embedder) => {
                info!(
                    provider = %config.embedding.provider,
                    model = %config.embedding.model,
                    "embedding backend ready"
                );
                Some(Arc::new(DocumentService::from_config(&config.ingest, embedder)))
            }
            None => {
                warn!("no embedding backend; PDF processing disabled and chats use abstracts only");
                None
            }
        };

        let providers = create_providers(&config.providers);
        if providers.is_empty() {
            warn!("no completion provider keys set; /chat-with-ai will report a configuration error");
        }

        Self::new(config, documents, providers)
    }
}
