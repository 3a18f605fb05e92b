//! BibTeX construction and formatting.
//!
//! - [`key`]: citation key rules per identifier kind
//! - [`parser`]: nom parser that keeps value shapes for re-rendering
//! - [`tidy`]: the normalizing formatter behind `/api/tidy`
//! - [`assemble`]: record to formatted text

pub mod assemble;
pub mod key;
pub mod parser;
pub mod tidy;

pub use assemble::{assemble, render};
pub use key::{arxiv_key, clean_string, isbn_key, url_key, UNKNOWN_KEY};
pub use tidy::{BibFormatter, Tidy, TidyOptions, TidyOutput};
