//! Configuration management.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file: `--config <FILE>`, else `./bibfetch.toml`, else
//!    `<config dir>/bibfetch/config.toml`
//! 3. environment variables prefixed `BIBFETCH_`, nested keys joined with `__`
//!    (e.g. `BIBFETCH_SERVER__PORT=8080`)
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [upstream]
//! doi_resolver = "https://doi.org"
//! openlibrary = "https://openlibrary.org"
//! arxiv_api = "https://export.arxiv.org/api/query"
//!
//! [http]
//! user_agent = "bibfetch/0.1.0"
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::DEFAULT_USER_AGENT;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "BIBFETCH";

/// Config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "bibfetch.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Upstream metadata services
    pub upstream: UpstreamConfig,

    /// Outbound HTTP client settings
    pub http: HttpConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Base URLs of the upstream services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// DOI resolver queried with `Accept: application/x-bibtex`
    pub doi_resolver: String,

    /// OpenLibrary host serving `/api/books`
    pub openlibrary: String,

    /// arXiv Atom query endpoint
    pub arxiv_api: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            doi_resolver: "https://doi.org".to_string(),
            openlibrary: "https://openlibrary.org".to_string(),
            arxiv_api: "https://export.arxiv.org/api/query".to_string(),
        }
    }
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Request timeout; unset means the transport default
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for this crate when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Render as TOML, e.g. for `bibfetch config`
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from an optional file plus the environment
///
/// A given `path` must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// First existing config file among the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("bibfetch").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.upstream.doi_resolver, "https://doi.org");
        assert_eq!(config.upstream.openlibrary, "https://openlibrary.org");
        assert_eq!(config.upstream.arxiv_api, "https://export.arxiv.org/api/query");
        assert_eq!(config.http.timeout_secs, None);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[server]
port = 8080

[upstream]
openlibrary = "http://localhost:9000"

[logging]
level = "debug"
format = "json"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.upstream.openlibrary, "http://localhost:9000");
        assert_eq!(config.upstream.doi_resolver, "https://doi.org");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("BIBFETCH_HTTP__TIMEOUT_SECS", "7");
        let config = load_config(None).unwrap();
        std::env::remove_var("BIBFETCH_HTTP__TIMEOUT_SECS");

        assert_eq!(config.http.timeout_secs, Some(7));
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/bibfetch.toml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_to_toml_round_trip() {
        let mut config = Config::default();
        config.http.timeout_secs = Some(30);

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[upstream]"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
