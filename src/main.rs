use anyhow::{bail, Context, Result};
use bibfetch::bibtex::{clean_string, BibFormatter, Tidy};
use bibfetch::client::{ApiClient, LookupMode};
use bibfetch::config::{find_config_file, load_config, Config, LogFormat};
use bibfetch::server::{self, AppState};
use bibfetch::service::CitationService;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// bibfetch - Generate tidy BibTeX entries from URLs, DOIs, ISBNs and arXiv IDs
#[derive(Parser, Debug)]
#[command(name = "bibfetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Generate tidy BibTeX entries from URLs, DOIs, ISBNs and arXiv identifiers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides server.port)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Resolve an identifier to BibTeX
    #[command(alias = "l")]
    Lookup {
        /// URL, DOI, ISBN or arxiv:<id>
        input: String,

        /// Identifier type; auto guesses from the input
        #[arg(long = "type", short = 't', value_enum, default_value_t = LookupMode::Auto)]
        mode: LookupMode,

        /// Ask a running server instead of fetching in-process
        #[arg(long, short)]
        server: Option<String>,
    },

    /// Tidy a BibTeX file, or stdin when no file is given
    Tidy {
        file: Option<PathBuf>,
    },

    /// Reduce text to ASCII letters, digits and underscores
    Clean {
        text: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration comes first so the log settings apply from the start
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config from the environment".to_string(),
    })?;

    init_tracing(&cli, &config);

    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Serve { host, port } => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let service = CitationService::from_config(&config)?;
            let state = Arc::new(AppState::new(service));
            server::serve(&server_config.bind_address(), state).await?;
        }

        Commands::Lookup {
            input,
            mode,
            server,
        } => {
            if input.trim().is_empty() {
                bail!("Input is empty");
            }

            let bibtex = match server {
                Some(base_url) => ApiClient::new(base_url).lookup(&input, mode).await?,
                None => {
                    let classified = mode.resolve(&input);
                    tracing::debug!(kind = %classified.kind, value = %classified.value, "Classified input");
                    CitationService::from_config(&config)?
                        .lookup(classified.kind, &classified.value)
                        .await?
                }
            };
            print!("{}", bibtex);
        }

        Commands::Tidy { file } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read stdin")?;
                    buffer
                }
            };

            let output = Tidy::default().tidy(&input);
            print!("{}", output.bibtex);
        }

        Commands::Clean { text } => {
            println!("{}", clean_string(&text));
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bibfetch={},tower_http={}", level, level)),
    );

    // Logs go to stderr so lookup output can be piped
    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
