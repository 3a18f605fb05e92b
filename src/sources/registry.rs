//! Registry for managing metadata sources.

use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "source-arxiv")]
use super::ArxivSource;
#[cfg(feature = "source-doi")]
use super::DoiSource;
#[cfg(feature = "source-isbn")]
use super::IsbnSource;
#[cfg(feature = "source-url")]
use super::UrlSource;
use super::{Source, SourceError};
use crate::config::Config;
use crate::models::IdentifierKind;
use crate::utils::HttpClient;

/// Registry for all available sources, one per identifier kind
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<IdentifierKind, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every compiled-in source, configured from `config`
    ///
    /// All sources share one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        #[allow(unused_variables)]
        let client = Arc::new(HttpClient::from_config(&config.http)?);
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "source-doi")]
        registry.register(Arc::new(
            DoiSource::with_client(client.clone()).with_base_url(&config.upstream.doi_resolver),
        ));
        #[cfg(feature = "source-isbn")]
        registry.register(Arc::new(
            IsbnSource::with_client(client.clone()).with_base_url(&config.upstream.openlibrary),
        ));
        #[cfg(feature = "source-url")]
        registry.register(Arc::new(UrlSource::with_client(client.clone())));
        #[cfg(feature = "source-arxiv")]
        registry.register(Arc::new(
            ArxivSource::with_client(client.clone()).with_base_url(&config.upstream.arxiv_api),
        ));

        tracing::debug!(sources = registry.len(), "Source registry initialized");
        Ok(registry)
    }

    /// Register a source, replacing any source for the same kind
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.kind(), source);
    }

    /// Get the source for an identifier kind
    pub fn get(&self, kind: IdentifierKind) -> Option<&Arc<dyn Source>> {
        self.sources.get(&kind)
    }

    /// Get the source for a kind, returning an error if none is registered
    pub fn get_required(&self, kind: IdentifierKind) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(kind)
            .ok_or_else(|| SourceError::NotFound(format!("Source for {}", kind)))
    }

    /// Get all registered sources
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.values()
    }

    /// Check if a kind has a source
    pub fn has(&self, kind: IdentifierKind) -> bool {
        self.sources.contains_key(&kind)
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
