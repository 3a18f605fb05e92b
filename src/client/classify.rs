//! Identifier classification for free-form user input.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{
    is_isbn, normalize_arxiv, normalize_doi, normalize_isbn, strip_arxiv_prefix, strip_doi_prefix,
    IdentifierKind,
};

/// Result of classifying an input string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classified {
    pub kind: IdentifierKind,
    /// Normalized identifier to send to the backend
    pub value: String,
}

impl Classified {
    fn new(kind: IdentifierKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// How a lookup picks its identifier kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LookupMode {
    /// Guess the kind from the input
    #[default]
    Auto,
    Doi,
    Isbn,
    Url,
    Arxiv,
}

impl LookupMode {
    /// Classify `input` under this mode
    ///
    /// Explicit modes force the kind but still strip the usual prefixes and
    /// separators from the value.
    pub fn resolve(self, input: &str) -> Classified {
        let input = input.trim();
        match self {
            LookupMode::Auto => classify(input),
            LookupMode::Doi => Classified::new(IdentifierKind::Doi, normalize_doi(input)),
            LookupMode::Isbn => Classified::new(IdentifierKind::Isbn, normalize_isbn(input)),
            LookupMode::Url => Classified::new(IdentifierKind::Url, input),
            LookupMode::Arxiv => Classified::new(IdentifierKind::Arxiv, normalize_arxiv(input)),
        }
    }
}

impl FromStr for LookupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(LookupMode::Auto);
        }
        Ok(match s.parse::<IdentifierKind>()? {
            IdentifierKind::Doi => LookupMode::Doi,
            IdentifierKind::Isbn => LookupMode::Isbn,
            IdentifierKind::Url => LookupMode::Url,
            IdentifierKind::Arxiv => LookupMode::Arxiv,
        })
    }
}

/// Decide which backend an input belongs to
///
/// Rules are tried in order: ISBN, `arxiv:` prefix, DOI resolver prefix,
/// `http(s)://` URL. Anything else is treated as a bare DOI. Bare arXiv IDs
/// such as `2101.00001` are not recognized and fall through to DOI.
pub fn classify(input: &str) -> Classified {
    let input = input.trim();

    let isbn = normalize_isbn(input);
    if is_isbn(&isbn) {
        return Classified::new(IdentifierKind::Isbn, isbn);
    }

    if let Some(id) = strip_arxiv_prefix(input) {
        return Classified::new(IdentifierKind::Arxiv, id.trim());
    }

    if let Some(doi) = strip_doi_prefix(input) {
        return Classified::new(IdentifierKind::Doi, doi);
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return Classified::new(IdentifierKind::Url, input);
    }

    Classified::new(IdentifierKind::Doi, input)
}
