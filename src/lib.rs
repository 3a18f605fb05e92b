//! # bibfetch
//!
//! Citation service turning a URL, DOI, ISBN or arXiv identifier into a tidy
//! BibTeX entry.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (BibRecord, IdentifierKind)
//! - [`sources`]: Metadata sources with extensible trait-based architecture
//! - [`bibtex`]: Citation keys, assembly, parsing and the tidy formatter
//! - [`service`]: The citation service shared by the server and the CLI
//! - [`server`]: axum HTTP API
//! - [`client`]: Typed client for the HTTP API and the input classifier
//! - [`utils`]: HTTP client and fallback chains
//! - [`config`]: Configuration management

pub mod bibtex;
pub mod client;
pub mod config;
pub mod models;
pub mod server;
pub mod service;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{BibRecord, IdentifierKind};
pub use service::CitationService;
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
