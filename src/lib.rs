//! # websift
//!
//! Semantic search over web pages.
//!
//! websift fetches HTML pages, partitions their content into token-bounded
//! chunks that remember where in the document they came from, embeds and
//! indexes the chunks in SQLite, and serves semantic search refined by a
//! cross-encoder re-ranker.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────┐
//! │  Fetch   │──▶│ Chunk + Embed │──▶│  SQLite   │
//! │  (HTTP)  │   │  (Pipeline)   │   │  Vectors  │
//! └──────────┘   └───────────────┘   └────┬─────┘
//!                                         │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │(websift) │       │  (JSON)  │
//!                └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! websift init                          # create database
//! websift ingest https://example.com/   # fetch, chunk, embed, index
//! websift search "deployment options"   # semantic search
//! websift serve http                    # start the JSON API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | HTML block extraction |
//! | [`chunk`] | Token-bounded chunking |
//! | [`tokenizer`] | Token-counting capability |
//! | [`fetch`] | Page retrieval |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`rerank`] | Cross-encoder re-ranking |
//! | [`search`] | Semantic search pipeline |
//! | [`server`] | JSON HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chunk;
pub mod config;
pub mod db;
pub mod embed_cmd;
pub mod embedding;
pub mod extract;
pub mod fetch;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod rerank;
pub mod search;
pub mod server;
pub mod stats;
pub mod tokenizer;
