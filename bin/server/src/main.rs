//! Draftsmith server binary.

mod config;
mod error;
mod ws;

use axum::{Router, routing::get};
use config::ServerConfig;
use draftsmith_ai::{LlmBackend, OpenAiBackend};
use draftsmith_chat::ChatService;
use draftsmith_conversation::ContextRegistry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let backend_config = config
        .llm
        .backend_config()
        .expect("invalid LLM configuration");

    let backend = Arc::new(OpenAiBackend::new(backend_config));
    tracing::info!(model = backend.model(), "Using LLM backend");
    let registry = Arc::new(ContextRegistry::new());
    let service = Arc::new(ChatService::new(registry, backend));

    let app = Router::new()
        .route("/ws/chat", get(ws::chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on ws://{}/ws/chat", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutting down");
}
