//! Citation service.
//!
//! One [`CitationService`] is built per process and shared by the HTTP
//! handlers and the CLI. It holds no mutable state: the source registry and
//! the formatter are injected, so tests can swap either.

use std::sync::Arc;

use crate::bibtex::{clean_string, BibFormatter, Tidy};
use crate::config::Config;
use crate::models::IdentifierKind;
use crate::sources::{SourceError, SourceRegistry};

/// Resolves identifiers to formatted BibTeX
#[derive(Clone)]
pub struct CitationService {
    registry: Arc<SourceRegistry>,
    formatter: Arc<dyn BibFormatter>,
}

impl CitationService {
    pub fn new(registry: Arc<SourceRegistry>, formatter: Arc<dyn BibFormatter>) -> Self {
        Self {
            registry,
            formatter,
        }
    }

    /// Service with every compiled-in source and the default formatter
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let registry = SourceRegistry::from_config(config)?;
        Ok(Self::new(Arc::new(registry), Arc::new(Tidy::default())))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fetch, assemble and tidy the entry for an identifier
    pub async fn lookup(&self, kind: IdentifierKind, id: &str) -> Result<String, SourceError> {
        let source = self.registry.get_required(kind)?;
        source.validate_id(id)?;

        tracing::debug!(source = source.id(), id, "Looking up identifier");
        let raw = source.fetch_bibtex(id).await?;

        Ok(self.tidy(&raw))
    }

    /// Normalize BibTeX text; never fails
    pub fn tidy(&self, bibtex: &str) -> String {
        self.formatter.tidy(bibtex).bibtex
    }

    /// Reduce text to ASCII word characters
    pub fn clean(&self, text: &str) -> String {
        clean_string(text)
    }
}

impl std::fmt::Debug for CitationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CitationService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
