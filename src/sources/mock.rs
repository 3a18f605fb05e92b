//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::{BibRecord, IdentifierKind};
use crate::sources::{Source, SourceError};

/// What the mock answers with
#[derive(Debug, Clone)]
enum MockResponse {
    Record(BibRecord),
    Bibtex(String),
    NotFound(String),
}

/// A mock source for testing that returns predefined responses.
///
/// Every call is recorded so tests can check what identifier reached the
/// source after routing and normalization.
#[derive(Debug)]
pub struct MockSource {
    kind: IdentifierKind,
    response: Mutex<Option<MockResponse>>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source for one identifier kind.
    pub fn new(kind: IdentifierKind) -> Self {
        Self {
            kind,
            response: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every lookup with this record.
    pub fn set_record(&self, record: BibRecord) {
        self.set(MockResponse::Record(record));
    }

    /// Answer every lookup with this raw BibTeX.
    pub fn set_bibtex(&self, bibtex: impl Into<String>) {
        self.set(MockResponse::Bibtex(bibtex.into()));
    }

    /// Fail every lookup with [`SourceError::NotFound`].
    pub fn set_not_found(&self, what: impl Into<String>) {
        self.set(MockResponse::NotFound(what.into()));
    }

    /// Clear the configured response.
    pub fn clear_response(&self) {
        if let Ok(mut guard) = self.response.lock() {
            *guard = None;
        }
    }

    /// Identifiers received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn set(&self, response: MockResponse) {
        if let Ok(mut guard) = self.response.lock() {
            *guard = Some(response);
        }
    }

    fn respond(&self, id: &str) -> Result<Option<MockResponse>, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(id.to_string());
        }
        self.response
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| SourceError::Other("mock response lock poisoned".to_string()))
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        self.kind.id()
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn kind(&self) -> IdentifierKind {
        self.kind
    }

    async fn fetch_record(&self, id: &str) -> Result<BibRecord, SourceError> {
        match self.respond(id)? {
            Some(MockResponse::Record(record)) => Ok(record),
            Some(MockResponse::NotFound(what)) => Err(SourceError::NotFound(what)),
            Some(MockResponse::Bibtex(_)) | None => Err(SourceError::NotImplemented),
        }
    }

    async fn fetch_bibtex(&self, id: &str) -> Result<String, SourceError> {
        match self.respond(id)? {
            Some(MockResponse::Bibtex(bibtex)) => Ok(bibtex),
            Some(MockResponse::Record(record)) => Ok(crate::bibtex::render(&record)),
            Some(MockResponse::NotFound(what)) => Err(SourceError::NotFound(what)),
            None => Err(SourceError::NotFound(self.kind.name().to_string())),
        }
    }
}
