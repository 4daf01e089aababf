use std::sync::Arc;

use modexp_prover::backend::Backend;
use modexp_prover::config::Config;
use modexp_prover::routes::{build_router, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modexp_prover=info".into()),
        )
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        panic!("Invalid configuration: {}", e);
    });

    tracing::info!("Starting with {} backend", config.backend.as_str());

    // Load or generate key material for the selected proof system
    let backend = Backend::from_config(&config).unwrap_or_else(|e| {
        panic!("Failed to initialize {} backend: {}", config.backend.as_str(), e);
    });

    let state = Arc::new(AppState::new(backend));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Prover service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            panic!("Failed to bind to {}: {}", addr, e);
        });

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            panic!("Server error: {}", e);
        });
}
