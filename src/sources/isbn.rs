//! ISBN source backed by the OpenLibrary books API.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::bibtex::isbn_key;
use crate::models::{normalize_isbn, BibRecord, BibRecordBuilder, Delimiter, EntryType, IdentifierKind};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Default OpenLibrary base URL
pub const OPENLIBRARY_URL: &str = "https://openlibrary.org";

/// ISBN source
#[derive(Debug, Clone)]
pub struct IsbnSource {
    client: Arc<HttpClient>,
    base_url: String,
}

impl IsbnSource {
    /// Create a new ISBN source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: OPENLIBRARY_URL.to_string(),
        }
    }

    /// Use a different OpenLibrary host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn books_url(&self, isbn: &str) -> String {
        format!(
            "{}/api/books?bibkeys=ISBN:{}&format=json&jscmd=data",
            self.base_url, isbn
        )
    }

    /// Map an OpenLibrary `jscmd=data` book object into a record
    pub fn parse_book(isbn: &str, book: &Value) -> BibRecord {
        let authors = names(book, "authors");
        let author = if authors.is_empty() {
            "unknown".to_string()
        } else {
            authors.join(" and ")
        };

        let title = str_field(book, "title");
        let year = str_field(book, "publish_date");
        let publisher = names(book, "publishers").into_iter().next().unwrap_or_default();
        let address = names(book, "publish_places")
            .into_iter()
            .next()
            .unwrap_or_default();

        let key = isbn_key(authors.first().map(String::as_str), &year);

        BibRecordBuilder::new(EntryType::Book, key)
            .delimiter(Delimiter::Quotes)
            .field("title", title)
            .field("author", author)
            .field("publisher", publisher)
            .field("year", year)
            .field("address", address)
            .field("isbn", isbn)
            .build()
    }
}

/// Non-empty `name` values of an array of `{ "name": ... }` objects
fn names(book: &Value, key: &str) -> Vec<String> {
    book.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .filter(|name| !name.trim().is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn str_field(book: &Value, key: &str) -> String {
    book.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Source for IsbnSource {
    fn id(&self) -> &str {
        "isbn"
    }

    fn name(&self) -> &str {
        "OpenLibrary"
    }

    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Isbn
    }

    /// Anything that is not digits (and a check character `X`) cannot be
    /// looked up and is reported the same way as an unknown ISBN.
    fn validate_id(&self, id: &str) -> Result<(), SourceError> {
        let isbn = normalize_isbn(id);
        if isbn.is_empty() || !isbn.chars().all(|c| c.is_ascii_digit() || c == 'X' || c == 'x') {
            return Err(SourceError::NotFound("ISBN".to_string()));
        }
        Ok(())
    }

    async fn fetch_record(&self, id: &str) -> Result<BibRecord, SourceError> {
        self.validate_id(id)?;
        let isbn = normalize_isbn(id);

        tracing::info!(isbn = %isbn, "Looking up ISBN");
        let body = self.client.get_text(&self.books_url(&isbn), None).await?;
        let data: Value = serde_json::from_str(&body)?;

        let book = data
            .get(format!("ISBN:{}", isbn))
            .ok_or_else(|| SourceError::NotFound("ISBN".to_string()))?;

        Ok(Self::parse_book(&isbn, book))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_book() {
        let book = json!({
            "authors": [{ "name": "John Doe" }, { "name": "Jane Roe" }],
            "title": "Test Book Title",
            "publish_date": "2021",
            "publishers": [{ "name": "Test Publisher" }, { "name": "Other" }],
            "publish_places": [{ "name": "Test Place" }]
        });

        let record = IsbnSource::parse_book("1234567890000", &book);
        assert_eq!(record.entry_type, EntryType::Book);
        assert_eq!(record.key, "Doe_2021");
        assert_eq!(record.delimiter, Delimiter::Quotes);
        assert_eq!(record.author(), Some("John Doe and Jane Roe"));
        assert_eq!(record.get("publisher"), Some("Test Publisher"));
        assert_eq!(record.get("address"), Some("Test Place"));
        assert_eq!(record.get("isbn"), Some("1234567890000"));
    }

    #[test]
    fn test_parse_sparse_book() {
        let book = json!({ "authors": [{ "name": "John Doe" }], "title": "Test Book Title" });
        let record = IsbnSource::parse_book("1234567890000", &book);
        assert_eq!(record.key, "Doe");
        assert_eq!(record.year(), Some(""));
        assert_eq!(record.get("publisher"), Some(""));
    }

    #[test]
    fn test_parse_book_without_author() {
        let record = IsbnSource::parse_book("0306406152", &json!({}));
        assert_eq!(record.key, "unknown");
        assert_eq!(record.author(), Some("unknown"));
    }

    #[test]
    fn test_publish_date_is_verbatim() {
        let book = json!({ "authors": [{ "name": "A B" }], "publish_date": "May 2004" });
        let record = IsbnSource::parse_book("0306406152", &book);
        assert_eq!(record.year(), Some("May 2004"));
        assert_eq!(record.key, "B_May2004");
    }

    #[test]
    fn test_validate_id() {
        let source = IsbnSource::new().unwrap();
        assert!(source.validate_id("978-3-16-148410-0").is_ok());
        assert!(source.validate_id("080442957X").is_ok());
        let err = source.validate_id("invalidISBN").unwrap_err();
        assert_eq!(err.to_string(), "ISBN not found");
    }

    #[tokio::test]
    async fn test_missing_isbn_key() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/books")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let source = IsbnSource::new().unwrap().with_base_url(server.url());
        let err = source.fetch_record("9783161484100").await.unwrap_err();
        assert_eq!(err.to_string(), "ISBN not found");
    }
}
