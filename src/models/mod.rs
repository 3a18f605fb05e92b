//! Core data models for bibliographic records and identifiers.

mod identifier;
mod record;

pub use identifier::{
    is_isbn, normalize_arxiv, normalize_doi, normalize_isbn, strip_arxiv_prefix,
    strip_doi_prefix, IdentifierKind,
};
pub use record::{BibRecord, BibRecordBuilder, Delimiter, EntryType, Field};
