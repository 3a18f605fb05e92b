//! HTTP server exposing the citation API.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /api/url/{*url}` | web page lookup |
//! | `GET /api/doi/{*doi}` | DOI lookup |
//! | `GET /api/isbn/{isbn}` | ISBN lookup |
//! | `GET /api/arxiv/{id}` | arXiv lookup |
//! | `POST /api/tidy` | tidy the request body |
//! | `POST /api/clean` | clean the request body |
//! | `GET /` | liveness probe |
//!
//! Every body is plain text. Lookup failures are answered with status 500
//! and the error message as body.

mod error;
mod handlers;

pub use error::ApiError;

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::service::CitationService;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: CitationService,
}

impl AppState {
    pub fn new(service: CitationService) -> Self {
        Self { service }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::alive))
        // Lookups
        .route("/api/url/{*url}", get(handlers::bibtex_by_url))
        .route("/api/doi/{*doi}", get(handlers::bibtex_by_doi))
        .route("/api/isbn/{isbn}", get(handlers::bibtex_by_isbn))
        .route("/api/arxiv/{id}", get(handlers::bibtex_by_arxiv))
        // Text utilities
        .route("/api/tidy", post(handlers::tidy))
        .route("/api/clean", post(handlers::clean))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("bibfetch server listening on {}", listener.local_addr()?);
    run(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}
