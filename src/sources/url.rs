//! Web page source: metadata from JSON-LD and meta tags.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

use ::url::Url;

use crate::bibtex::url_key;
use crate::models::{BibRecord, BibRecordBuilder, EntryType, IdentifierKind};
use crate::sources::{Source, SourceError};
use crate::utils::{first_non_empty, Extractor, HttpClient};

/// `2020-05` or a bare `2020`
static PARTIAL_DATE_RE: OnceLock<Regex> = OnceLock::new();

/// Web page source
///
/// Extraction order per field:
/// - author: JSON-LD `author` → `meta[name=author]` → `meta[name=twitter:data1]`
/// - title: JSON-LD `headline` → `og:title` → `meta[name=title]` → `<head><title>`
/// - date: JSON-LD `datePublished` → `meta[property=article:published_time]`
#[derive(Debug, Clone)]
pub struct UrlSource {
    client: Arc<HttpClient>,
}

impl UrlSource {
    /// Create a new web page source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self::with_client(Arc::new(HttpClient::new()?)))
    }

    /// Create with a custom HTTP client
    pub fn with_client(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Parse and check an http(s) URL
    pub fn parse_url(input: &str) -> Result<Url, SourceError> {
        let url = Url::parse(input.trim())
            .map_err(|e| SourceError::InvalidRequest(format!("Invalid URL '{}': {}", input, e)))?;

        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            _ => Err(SourceError::InvalidRequest(format!(
                "Unsupported URL '{}': only http and https are allowed",
                input
            ))),
        }
    }

    /// Build a record from a fetched page
    ///
    /// `url` is written to the entry as given, `urldate` is the access date.
    pub fn parse_page(url: &str, html: &str, urldate: &str) -> Result<BibRecord, SourceError> {
        let parsed = Self::parse_url(url)?;
        let document = Html::parse_document(html);
        let json_ld = json_ld(&document);

        let author_chain: Vec<Extractor> = vec![
            Box::new(|| json_ld.as_ref().and_then(json_ld_author)),
            Box::new(|| meta_content(&document, "name", "author")),
            Box::new(|| meta_content(&document, "name", "twitter:data1")),
        ];
        let author = first_non_empty(&author_chain);

        let title_chain: Vec<Extractor> = vec![
            Box::new(|| json_ld.as_ref().and_then(|v| json_ld_str(v, "headline"))),
            Box::new(|| meta_content(&document, "name", "og:title")),
            Box::new(|| meta_content(&document, "property", "og:title")),
            Box::new(|| meta_content(&document, "name", "title")),
            Box::new(|| head_title(&document)),
        ];
        let title = first_non_empty(&title_chain);

        let date_chain: Vec<Extractor> = vec![
            Box::new(|| json_ld.as_ref().and_then(|v| json_ld_str(v, "datePublished"))),
            Box::new(|| meta_content(&document, "property", "article:published_time")),
        ];
        let (year, month) = year_and_month(&first_non_empty(&date_chain));

        let host = parsed.host_str().unwrap_or_default();
        let key = url_key(host, &year);

        Ok(BibRecordBuilder::new(EntryType::Online, key)
            .field("author", author)
            .field("title", title)
            .field("url", url.trim())
            .field("month", month)
            .field("year", year)
            .field("urldate", urldate)
            .build())
    }
}

#[async_trait]
impl Source for UrlSource {
    fn id(&self) -> &str {
        "url"
    }

    fn name(&self) -> &str {
        "Web page"
    }

    fn kind(&self) -> IdentifierKind {
        IdentifierKind::Url
    }

    fn validate_id(&self, id: &str) -> Result<(), SourceError> {
        Self::parse_url(id).map(|_| ())
    }

    async fn fetch_record(&self, id: &str) -> Result<BibRecord, SourceError> {
        let url = Self::parse_url(id)?;

        tracing::info!(url = %url, "Fetching web page");
        let html = self.client.get_text(url.as_str(), None).await?;
        let urldate = Utc::now().format("%Y-%m-%d").to_string();

        Self::parse_page(id, &html, &urldate)
    }
}

/// First JSON-LD object on the page; arrays contribute their first element
fn json_ld(document: &Html) -> Option<Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    document.select(&selector).find_map(|script| {
        let raw: String = script.text().collect();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(Value::Array(items)) => items.into_iter().find(Value::is_object),
            Ok(value) if value.is_object() => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed JSON-LD");
                None
            }
        }
    })
}

fn json_ld_str(json_ld: &Value, key: &str) -> Option<String> {
    json_ld.get(key).and_then(Value::as_str).map(str::to_string)
}

/// `author` as an object with `name`, a plain string, or an array of either
fn json_ld_author(json_ld: &Value) -> Option<String> {
    fn name_of(author: &Value) -> Option<String> {
        author
            .as_str()
            .or_else(|| author.get("name").and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    let author = json_ld.get("author")?;
    match author.as_array() {
        Some(authors) => {
            let names: Vec<String> = authors.iter().filter_map(name_of).collect();
            (!names.is_empty()).then(|| names.join(" and "))
        }
        None => name_of(author),
    }
}

fn meta_content(document: &Html, attr: &str, value: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[{}="{}"]"#, attr, value)).ok()?;
    document
        .select(&selector)
        .find_map(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
}

fn head_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("head title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
}

/// Year and lowercase three-letter month; both empty when the date is unusable
fn year_and_month(date: &str) -> (String, String) {
    match parse_date(date.trim()) {
        Some(PartialDate::Full(date)) => (
            date.year().to_string(),
            date.format("%b").to_string().to_lowercase(),
        ),
        Some(PartialDate::Year(year)) => (year, String::new()),
        None => (String::new(), String::new()),
    }
}

enum PartialDate {
    Full(NaiveDate),
    Year(String),
}

fn parse_date(date: &str) -> Option<PartialDate> {
    if date.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(PartialDate::Full(dt.date_naive()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(date) {
        return Some(PartialDate::Full(dt.date_naive()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, format) {
            return Some(PartialDate::Full(dt.date()));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(PartialDate::Full(d));
    }

    let caps = PARTIAL_DATE_RE
        .get_or_init(|| Regex::new(r"^(\d{4})(?:-(\d{2}))?$").expect("static date pattern"))
        .captures(date)?;
    let year = caps.get(1)?.as_str();
    match caps.get(2) {
        Some(month) => NaiveDate::parse_from_str(&format!("{}-{}-01", year, month.as_str()), "%Y-%m-%d")
            .ok()
            .map(PartialDate::Full),
        None => Some(PartialDate::Year(year.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLDATE: &str = "2024-01-31";

    fn page(head: &str) -> String {
        format!("<html><head>{}</head><body><p>content</p></body></html>", head)
    }

    #[test]
    fn test_json_ld_wins_over_meta() {
        let html = page(
            r#"<script type="application/ld+json">
                {"@type": "Article", "headline": "JSON Title", "author": {"name": "John Doe"},
                 "datePublished": "2020-03-15T10:00:00Z"}
            </script>
            <meta name="author" content="Meta Author">
            <meta name="og:title" content="Meta Title">
            <title>Page Title</title>"#,
        );

        let record = UrlSource::parse_page("https://example.com/post", &html, URLDATE).unwrap();
        assert_eq!(record.entry_type, EntryType::Online);
        assert_eq!(record.key, "ExampleCom2020");
        assert_eq!(record.author(), Some("John Doe"));
        assert_eq!(record.title(), Some("JSON Title"));
        assert_eq!(record.year(), Some("2020"));
        assert_eq!(record.get("month"), Some("mar"));
        assert_eq!(record.get("url"), Some("https://example.com/post"));
        assert_eq!(record.get("urldate"), Some(URLDATE));
    }

    #[test]
    fn test_meta_fallbacks() {
        let html = page(
            r#"<meta name="twitter:data1" content="Twitter Author">
            <meta name="title" content="Meta Title">
            <meta property="article:published_time" content="2019-12-01">
            <title>Page Title</title>"#,
        );

        let record = UrlSource::parse_page("https://www.example.org", &html, URLDATE).unwrap();
        assert_eq!(record.author(), Some("Twitter Author"));
        assert_eq!(record.title(), Some("Meta Title"));
        assert_eq!(record.get("month"), Some("dec"));
        assert_eq!(record.key, "WwwExampleOrg2019");
    }

    #[test]
    fn test_head_title_fallback() {
        let html = page("<title>  Test Page Title </title>");
        let record = UrlSource::parse_page("http://example.com", &html, URLDATE).unwrap();
        assert_eq!(record.title(), Some("Test Page Title"));
        assert_eq!(record.author(), Some(""));
        assert_eq!(record.key, "ExampleCom");
    }

    #[test]
    fn test_nothing_present_keeps_url_and_urldate() {
        let record = UrlSource::parse_page("http://example.com", "<html></html>", URLDATE).unwrap();
        assert_eq!(record.populated_fields(), vec!["url", "urldate"]);
    }

    #[test]
    fn test_malformed_json_ld_is_ignored() {
        let html = page(
            r#"<script type="application/ld+json">{ not json </script>
            <meta name="author" content="Meta Author">"#,
        );
        let record = UrlSource::parse_page("https://example.com", &html, URLDATE).unwrap();
        assert_eq!(record.author(), Some("Meta Author"));
    }

    #[test]
    fn test_json_ld_array_and_author_list() {
        let html = page(
            r#"<script type="application/ld+json">
                [{"headline": "First", "author": [{"name": "Ada Lovelace"}, "Charles Babbage"]},
                 {"headline": "Second"}]
            </script>"#,
        );
        let record = UrlSource::parse_page("https://example.com", &html, URLDATE).unwrap();
        assert_eq!(record.title(), Some("First"));
        assert_eq!(record.author(), Some("Ada Lovelace and Charles Babbage"));
    }

    #[test]
    fn test_unparseable_date_leaves_year_and_month_empty() {
        let html = page(r#"<meta property="article:published_time" content="sometime last week">"#);
        let record = UrlSource::parse_page("https://example.com", &html, URLDATE).unwrap();
        assert_eq!(record.year(), Some(""));
        assert_eq!(record.get("month"), Some(""));
        assert_eq!(record.key, "ExampleCom");
    }

    #[test]
    fn test_year_and_month_formats() {
        assert_eq!(year_and_month("2021-07-04T12:00:00+02:00"), ("2021".into(), "jul".into()));
        assert_eq!(year_and_month("2021-07-04T12:00:00"), ("2021".into(), "jul".into()));
        assert_eq!(year_and_month("Tue, 1 Jul 2003 10:52:37 +0200"), ("2003".into(), "jul".into()));
        assert_eq!(year_and_month("2018-11"), ("2018".into(), "nov".into()));
        assert_eq!(year_and_month("2018"), ("2018".into(), String::new()));
        assert_eq!(year_and_month(""), (String::new(), String::new()));
    }

    #[test]
    fn test_partial_date_pattern_is_shared() {
        assert_eq!(year_and_month("1999-12"), ("1999".into(), "dec".into()));
        let compiled = PARTIAL_DATE_RE.get().map(|re| re as *const Regex);
        assert!(compiled.is_some());

        assert_eq!(year_and_month("2000"), ("2000".into(), String::new()));
        assert_eq!(PARTIAL_DATE_RE.get().map(|re| re as *const Regex), compiled);
    }

    #[test]
    fn test_parse_url_rejects_non_http() {
        assert!(UrlSource::parse_url("https://example.com/a?b=c").is_ok());
        assert!(matches!(
            UrlSource::parse_url("ftp://example.com"),
            Err(SourceError::InvalidRequest(_))
        ));
        assert!(UrlSource::parse_url("not a url").is_err());
        assert!(UrlSource::parse_url("file:///etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_fetch_record_from_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/article")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(page(r#"<meta name="author" content="John Doe"><title>Test Page Title</title>"#))
            .create_async()
            .await;

        let source = UrlSource::new().unwrap();
        let url = format!("{}/article", server.url());
        let record = source.fetch_record(&url).await.unwrap();

        assert_eq!(record.author(), Some("John Doe"));
        assert_eq!(record.get("url"), Some(url.as_str()));
        assert_eq!(record.get("urldate").map(str::len), Some(10));
        mock.assert_async().await;
    }
}
