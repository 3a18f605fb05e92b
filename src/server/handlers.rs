//! HTTP endpoint handlers

use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};

use super::{ApiError, AppState};
use crate::models::IdentifierKind;

/// Liveness probe
pub async fn alive() -> &'static str {
    "I'm alive!"
}

/// BibTeX for a web page
///
/// The URL may arrive percent-encoded or raw. A raw URL's query string is
/// split off by the router, so it is put back before fetching.
pub async fn bibtex_by_url(
    State(state): State<Arc<AppState>>,
    Path(url): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<String, ApiError> {
    let url = match query {
        Some(query) if !query.is_empty() => format!("{}?{}", url, query),
        _ => url,
    };
    lookup(&state, IdentifierKind::Url, &url).await
}

/// BibTeX for a DOI, which may contain slashes
pub async fn bibtex_by_doi(
    State(state): State<Arc<AppState>>,
    Path(doi): Path<String>,
) -> Result<String, ApiError> {
    lookup(&state, IdentifierKind::Doi, &doi).await
}

/// BibTeX for an ISBN
pub async fn bibtex_by_isbn(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<String, ApiError> {
    lookup(&state, IdentifierKind::Isbn, &isbn).await
}

/// BibTeX for an arXiv identifier
pub async fn bibtex_by_arxiv(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    lookup(&state, IdentifierKind::Arxiv, &id).await
}

/// Tidy the BibTeX in the request body
pub async fn tidy(State(state): State<Arc<AppState>>, body: String) -> String {
    state.service.tidy(&body)
}

/// Strip everything but ASCII word characters from the request body
pub async fn clean(State(state): State<Arc<AppState>>, body: String) -> String {
    state.service.clean(&body)
}

async fn lookup(state: &AppState, kind: IdentifierKind, id: &str) -> Result<String, ApiError> {
    tracing::info!(kind = kind.id(), id, "Lookup request");
    Ok(state.service.lookup(kind, id).await?)
}
