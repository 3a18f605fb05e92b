//! Metadata sources with a trait-based plugin architecture.
//!
//! Every identifier kind is served by one [`Source`] implementation, looked up
//! through the [`SourceRegistry`]. A source issues exactly one upstream
//! request per lookup and never retries.
//!
//! # Feature Flags
//!
//! Individual sources can be disabled at compile time using Cargo features:
//!
//! - `doi` - DOI resolver returning BibTeX by content negotiation (default: enabled)
//! - `isbn` - OpenLibrary books API (default: enabled)
//! - `webpage` - Arbitrary web pages via JSON-LD and meta tags (default: enabled)
//! - `arxiv` - arXiv Atom API (default: enabled)
//!
//! ```bash
//! # Only DOI and arXiv lookups
//! cargo build --no-default-features --features "doi,arxiv"
//! ```
//!
//! # Upstream endpoints
//!
//! Base URLs come from the `[upstream]` configuration section, so a source
//! can be pointed at a mirror or a local mock server.

#[cfg(feature = "source-arxiv")]
mod arxiv;
#[cfg(feature = "source-doi")]
mod doi;
#[cfg(feature = "source-isbn")]
mod isbn;
mod registry;
#[cfg(feature = "source-url")]
mod url;

pub mod mock;

#[cfg(feature = "source-arxiv")]
pub use arxiv::ArxivSource;
#[cfg(feature = "source-doi")]
pub use doi::DoiSource;
#[cfg(feature = "source-isbn")]
pub use isbn::IsbnSource;
pub use mock::MockSource;
pub use registry::SourceRegistry;
#[cfg(feature = "source-url")]
pub use url::UrlSource;

use async_trait::async_trait;

use crate::bibtex;
use crate::models::{BibRecord, IdentifierKind};

/// The Source trait defines the interface for all metadata sources.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Implement `id`, `name`, `kind` and `fetch_record`
/// 3. Override `fetch_bibtex` if the upstream already speaks BibTeX
/// 4. Register it with [`SourceRegistry::register`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "doi", "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// The identifier kind this source resolves
    fn kind(&self) -> IdentifierKind;

    /// Validate an identifier before any network I/O
    fn validate_id(&self, _id: &str) -> Result<(), SourceError> {
        Ok(())
    }

    /// Fetch metadata and map it into a record
    async fn fetch_record(&self, _id: &str) -> Result<BibRecord, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Fetch raw, not yet tidied BibTeX for an identifier
    async fn fetch_bibtex(&self, id: &str) -> Result<String, SourceError> {
        let record = self.fetch_record(id).await?;
        Ok(bibtex::render(&record))
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Upstream unreachable or the body could not be read
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed upstream payload (XML, JSON, HTML)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed identifier
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream answered but has no data for the identifier
    #[error("{0} not found")]
    NotFound(String),

    /// Upstream returned a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
