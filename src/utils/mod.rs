//! Utility modules shared by the sources.
//!
//! - [`HttpClient`]: reqwest wrapper used for every upstream call
//! - [`first_non_empty`]: ordered fallback chain used by the field extractors
//!
//! # Fallback chains
//!
//! ```rust
//! use bibfetch::utils::{first_non_empty, Extractor};
//!
//! let json_ld: Option<&str> = None;
//! let meta = Some("John Doe");
//!
//! let chain: Vec<Extractor> = vec![
//!     Box::new(|| json_ld.map(String::from)),
//!     Box::new(|| meta.map(String::from)),
//! ];
//! assert_eq!(first_non_empty(&chain), "John Doe");
//! ```

mod fallback;
mod http;

pub use fallback::{first_non_empty, Extractor};
pub use http::{HttpClient, DEFAULT_USER_AGENT};
