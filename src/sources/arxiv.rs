//! arXiv source implementation.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;

use crate::bibtex::arxiv_key;
use crate::models::{normalize_arxiv, BibRecord, BibRecordBuilder, Delimiter, EntryType, IdentifierKind};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Default arXiv API endpoint
pub const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
/// Base URL for abstract pages
const ARXIV_ABS_URL: &str = "https://arxiv.org/abs";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(default)]
    published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: Option<String>,
}

/// arXiv source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    api_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            api_url: ARXIV_API_URL.to_string(),
        }
    }

    /// Use a different query endpoint
    pub fn with_base_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn query_url(&self, id: &str) -> String {
        format!("{}?id_list={}", self.api_url, urlencoding::encode(id))
    }

    /// Parse an Atom feed into a record for `id`
    pub fn parse_feed(id: &str, xml: &str) -> Result<BibRecord, SourceError> {
        let feed: Feed = from_str(xml)?;
        let not_found = || SourceError::NotFound("arXiv ID".to_string());

        let entry = feed.entries.into_iter().next().ok_or_else(not_found)?;

        // Unknown or malformed IDs come back as a single entry under /api/errors
        if entry.id.as_deref().is_some_and(|e| e.contains("/api/errors")) {
            return Err(not_found());
        }

        let title = entry.title.as_deref().map(str::trim).unwrap_or_default().to_string();
        let authors: Vec<String> = entry
            .authors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        if title.is_empty() && authors.is_empty() {
            return Err(not_found());
        }

        let year: String = entry
            .published
            .as_deref()
            .map(|p| p.trim().chars().take(4).collect())
            .unwrap_or_default();

        let key = arxiv_key(authors.first().map(String::as_str), &year);

        Ok(BibRecordBuilder::new(EntryType::Article, key)
            .delimiter(Delimiter::Quotes)
            .field("title", title)
            .field("author", authors.join(" and "))
            .field("year", year)
            .field("eprint", format!("arXiv:{}", id))
            .field("url", format!("{}/{}", ARXIV_ABS_URL, id))
            .build())
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Arxiv
    }

    fn validate_id(&self, id: &str) -> Result<(), SourceError> {
        if normalize_arxiv(id).is_empty() {
            return Err(SourceError::InvalidRequest("Empty arXiv ID".to_string()));
        }
        Ok(())
    }

    async fn fetch_record(&self, id: &str) -> Result<BibRecord, SourceError> {
        self.validate_id(id)?;
        let id = normalize_arxiv(id);

        tracing::info!(arxiv_id = id, "Querying arXiv");
        let xml = self.client.get_text(&self.query_url(id), None).await?;
        Self::parse_feed(id, &xml)
    }
}
