//! # websift CLI
//!
//! The `websift` binary is the primary interface for websift. It provides
//! commands for database initialization, page ingestion, semantic search,
//! embedding management, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! websift --config ./config/websift.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `websift init` | Create the SQLite database and run schema migrations |
//! | `websift ingest <url>` | Fetch a page, chunk it, embed and index the chunks |
//! | `websift search "<query>"` | Semantic search over indexed chunks |
//! | `websift get <id>` | Show a stored page and its chunks |
//! | `websift embed pending` | Backfill missing or stale embeddings |
//! | `websift embed rebuild` | Delete and regenerate all embeddings |
//! | `websift stats` | Database overview |
//! | `websift serve http` | Start the JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! websift init --config ./config/websift.toml
//!
//! # Index a page
//! websift ingest https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html
//!
//! # Search it
//! websift search "borrow checker" --k 5
//!
//! # Start the HTTP API
//! websift serve http
//! ```

mod chunk;
mod config;
mod db;
mod embed_cmd;
mod embedding;
mod extract;
mod fetch;
mod get;
mod ingest;
mod migrate;
mod models;
mod rerank;
mod search;
mod server;
mod stats;
mod tokenizer;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// websift — semantic search over web pages.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/websift.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "websift",
    about = "websift — semantic search over web pages",
    version,
    long_about = "websift fetches HTML pages, chunks their content into token-bounded segments, \
    embeds and indexes the chunks in SQLite, and serves semantic search refined by a \
    cross-encoder re-ranker via a CLI and a JSON HTTP server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/websift.toml`. All database, chunking,
    /// embedding, rerank, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/websift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (pages, chunks, embeddings, chunk_vectors). This command is
    /// idempotent — running it multiple times is safe.
    Init,

    /// Fetch a page and index its chunks.
    ///
    /// Downloads the URL, extracts content blocks, accumulates them into
    /// token-bounded chunks, optionally embeds them, and stores everything
    /// in SQLite. Re-ingesting a URL replaces its chunks.
    Ingest {
        /// The page URL (http:// or https://).
        url: String,

        /// Read the HTML from a local file instead of fetching the URL.
        /// The page is still recorded under the given URL.
        #[arg(long)]
        html_file: Option<PathBuf>,

        /// Dry run — show chunk counts without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Search indexed chunks.
    ///
    /// Embeds the query, ranks stored vectors by cosine similarity, and
    /// re-scores the candidates with the configured cross-encoder.
    /// Requires an embedding provider to be configured.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        k: Option<i64>,
    },

    /// Retrieve a page by its UUID.
    ///
    /// Prints the page's metadata and all of its chunks.
    Get {
        /// Page UUID.
        id: String,
    },

    /// Manage embedding vectors.
    ///
    /// Subcommands for backfilling and rebuilding embeddings. Requires an
    /// embedding provider (e.g., OpenAI or Ollama) to be configured.
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },

    /// Show database statistics.
    ///
    /// Page and chunk counts, embedding coverage, and a per-page breakdown.
    Stats,

    /// Start the JSON HTTP server.
    ///
    /// Exposes `/ingest`, `/search`, and `/health` for browser frontends
    /// and other services.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Embedding management subcommands.
#[derive(Subcommand)]
enum EmbedAction {
    /// Embed chunks that are missing or have stale embeddings.
    ///
    /// Finds chunks without embeddings (or with changed text) and generates
    /// new embedding vectors using the configured provider.
    Pending {
        /// Maximum number of chunks to embed in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Override the batch size from config (number of texts per API call).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Show counts without performing any embedding.
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete and regenerate all embeddings.
    ///
    /// Useful when switching embedding models or dimensions. Clears all
    /// existing vectors and re-embeds every chunk.
    Rebuild {
        /// Override the batch size from config (number of texts per API call).
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the JSON HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// the websift API endpoints.
    Http,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            url,
            html_file,
            dry_run,
        } => {
            ingest::run_ingest(&cfg, &url, html_file.as_deref(), dry_run).await?;
        }
        Commands::Search { query, k } => {
            search::run_search(&cfg, &query, k).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Pending {
                limit,
                batch_size,
                dry_run,
            } => {
                embed_cmd::run_embed_pending(&cfg, limit, batch_size, dry_run).await?;
            }
            EmbedAction::Rebuild { batch_size } => {
                embed_cmd::run_embed_rebuild(&cfg, batch_size).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Http => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
