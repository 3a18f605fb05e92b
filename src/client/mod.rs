//! Typed client for a running bibfetch server.
//!
//! [`ApiClient`] wraps the lookup endpoints and the tidy endpoint behind one
//! interface; [`ApiClient::lookup`] classifies free-form input first.
//!
//! ```no_run
//! use bibfetch::client::{ApiClient, LookupMode};
//!
//! # async fn run() -> Result<(), bibfetch::client::ClientError> {
//! let client = ApiClient::new("http://127.0.0.1:3000");
//! let bibtex = client.lookup("arxiv:2101.00001", LookupMode::Auto).await?;
//! println!("{}", bibtex);
//! # Ok(())
//! # }
//! ```

mod classify;

pub use classify::{classify, Classified, LookupMode};

use reqwest::{Client, Response};

use crate::models::IdentifierKind;

/// Client-side errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Input is empty")]
    EmptyInput,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// HTTP client for the citation API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn bibtex_by_doi(&self, doi: &str) -> Result<String, ClientError> {
        self.fetch(IdentifierKind::Doi, doi).await
    }

    pub async fn bibtex_by_isbn(&self, isbn: &str) -> Result<String, ClientError> {
        self.fetch(IdentifierKind::Isbn, isbn).await
    }

    pub async fn bibtex_by_url(&self, url: &str) -> Result<String, ClientError> {
        self.fetch(IdentifierKind::Url, url).await
    }

    pub async fn bibtex_by_arxiv(&self, id: &str) -> Result<String, ClientError> {
        self.fetch(IdentifierKind::Arxiv, id).await
    }

    /// Send BibTeX to the tidy endpoint
    pub async fn tidy(&self, bibtex: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!("{}/api/tidy", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(bibtex.to_string())
            .send()
            .await?;

        read_body(response).await
    }

    /// Classify `input` under `mode` and fetch its BibTeX
    pub async fn lookup(&self, input: &str, mode: LookupMode) -> Result<String, ClientError> {
        if input.trim().is_empty() {
            return Err(ClientError::EmptyInput);
        }

        let classified = mode.resolve(input);
        tracing::debug!(kind = %classified.kind, value = %classified.value, "Classified input");
        self.fetch(classified.kind, &classified.value).await
    }

    async fn fetch(&self, kind: IdentifierKind, id: &str) -> Result<String, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::EmptyInput);
        }

        let url = format!(
            "{}/api/{}/{}",
            self.base_url,
            kind.id(),
            urlencoding::encode(id)
        );
        let response = self.client.get(&url).send().await?;
        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::Server {
            status: status.as_u16(),
            body,
        })
    }
}
