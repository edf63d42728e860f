mod api;
mod router;
mod state;

use std::sync::Arc;

use tracing::info;

fn load_config() -> paperchat_core::Config {
    paperchat_core::config::load_dotenv();
    paperchat_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config();
    config.log_summary();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(state::AppState::from_config(config));
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
