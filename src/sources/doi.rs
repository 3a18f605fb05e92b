//! DOI source: BibTeX by content negotiation on the DOI resolver.

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{normalize_doi, IdentifierKind};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Default DOI resolver
pub const DOI_RESOLVER_URL: &str = "https://doi.org";

/// Media type asking the resolver for BibTeX
const BIBTEX_ACCEPT: &str = "application/x-bibtex; charset=utf-8";

/// DOI source
///
/// The resolver already answers with BibTeX, so this source has no field
/// extraction or key generation: the upstream text goes straight to tidy.
#[derive(Debug, Clone)]
pub struct DoiSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl DoiSource {
    /// Create a new DOI source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: DOI_RESOLVER_URL.to_string(),
        }
    }

    /// Use a different resolver (mirror or mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn resolve_url(&self, doi: &str) -> String {
        format!("{}/{}", self.base_url, doi)
    }
}

#[async_trait]
impl Source for DoiSource {
    fn id(&self) -> &str {
        "doi"
    }

    fn name(&self) -> &str {
        "DOI"
    }

    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Doi
    }

    fn validate_id(&self, id: &str) -> Result<(), SourceError> {
        if normalize_doi(id).is_empty() {
            return Err(SourceError::InvalidRequest("Empty DOI".to_string()));
        }
        Ok(())
    }

    async fn fetch_bibtex(&self, id: &str) -> Result<String, SourceError> {
        self.validate_id(id)?;
        let doi = normalize_doi(id);

        tracing::info!(doi, "Resolving DOI");
        let body = self
            .client
            .get_text(&self.resolve_url(doi), Some(BIBTEX_ACCEPT))
            .await?;

        if body.trim().is_empty() {
            return Err(SourceError::NotFound("DOI".to_string()));
        }

        Ok(body)
    }
}
