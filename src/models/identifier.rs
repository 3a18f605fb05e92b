//! Identifier kinds understood by the service.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

/// Resolver prefixes accepted in front of a DOI
const DOI_PREFIXES: [&str; 4] = [
    "https://doi.org/",
    "https://dx.doi.org/",
    "doi.org/",
    "dx.doi.org/",
];

const ARXIV_PREFIX: &str = "arxiv:";

static ISBN_RE: OnceLock<Regex> = OnceLock::new();

/// The kind of identifier a lookup is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Doi,
    Isbn,
    Url,
    Arxiv,
}

impl IdentifierKind {
    /// All kinds, in routing order
    pub const ALL: [IdentifierKind; 4] = [
        IdentifierKind::Doi,
        IdentifierKind::Isbn,
        IdentifierKind::Url,
        IdentifierKind::Arxiv,
    ];

    /// Returns the identifier used in API paths (e.g. `/api/doi/...`)
    pub fn id(&self) -> &'static str {
        match self {
            IdentifierKind::Doi => "doi",
            IdentifierKind::Isbn => "isbn",
            IdentifierKind::Url => "url",
            IdentifierKind::Arxiv => "arxiv",
        }
    }

    /// Returns the display name
    pub fn name(&self) -> &'static str {
        match self {
            IdentifierKind::Doi => "DOI",
            IdentifierKind::Isbn => "ISBN",
            IdentifierKind::Url => "URL",
            IdentifierKind::Arxiv => "arXiv",
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IdentifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doi" => Ok(IdentifierKind::Doi),
            "isbn" => Ok(IdentifierKind::Isbn),
            "url" => Ok(IdentifierKind::Url),
            "arxiv" => Ok(IdentifierKind::Arxiv),
            other => Err(format!("unknown identifier kind: {}", other)),
        }
    }
}

/// Strip a resolver prefix (`https://doi.org/` etc.) from a DOI
///
/// Returns `None` when the input carries no known prefix.
pub fn strip_doi_prefix(input: &str) -> Option<&str> {
    DOI_PREFIXES
        .iter()
        .find_map(|prefix| strip_prefix_ignore_case(input, prefix))
}

/// Trimmed DOI with any resolver prefix removed
pub fn normalize_doi(input: &str) -> &str {
    let input = input.trim();
    strip_doi_prefix(input).unwrap_or(input)
}

/// Strip an explicit `arxiv:` prefix (case-insensitive)
pub fn strip_arxiv_prefix(input: &str) -> Option<&str> {
    strip_prefix_ignore_case(input, ARXIV_PREFIX)
}

/// Trimmed arXiv ID with any `arxiv:` prefix removed
pub fn normalize_arxiv(input: &str) -> &str {
    let input = input.trim();
    strip_arxiv_prefix(input).map(str::trim).unwrap_or(input)
}

/// Remove hyphens and whitespace from an ISBN
pub fn normalize_isbn(input: &str) -> String {
    input
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect()
}

/// Whether an already normalized string is an ISBN-10 or ISBN-13
pub fn is_isbn(normalized: &str) -> bool {
    ISBN_RE
        .get_or_init(|| {
            Regex::new(r"^(?:\d{9}[\dX]|(?:978|979)\d{10})$").expect("static ISBN pattern")
        })
        .is_match(normalized)
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        input.get(prefix.len()..)
    } else {
        None
    }
}
