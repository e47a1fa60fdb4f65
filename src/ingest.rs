//! Ingestion pipeline orchestration.
//!
//! Coordinates the full ingest flow: fetch → chunk → page upsert → chunk
//! replacement → inline embedding. Re-ingesting a URL replaces its chunks
//! transactionally; embedding failures are non-fatal and leave chunks
//! pending for `embed pending`.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::path::Path;
use uuid::Uuid;

use crate::chunk::chunk_page;
use crate::config::Config;
use crate::db;
use crate::embed_cmd;
use crate::extract;
use crate::fetch;
use crate::models::Chunk;
use crate::tokenizer;

/// What one ingest call did, for reporting.
pub struct IngestOutcome {
    pub page_id: String,
    pub title: Option<String>,
    pub chunks_written: u64,
    pub embeddings_written: u64,
    pub embeddings_pending: u64,
}

/// CLI entry point: fetch (or read) the page, ingest it, print a summary.
pub async fn run_ingest(
    config: &Config,
    url: &str,
    html_file: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let html = match html_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read HTML file: {}", path.display()))?,
        None => fetch::fetch_page(&config.fetch, url).await?,
    };

    if dry_run {
        let counter = tokenizer::create_counter(&config.tokenizer)?;
        let chunks = chunk_page("tmp", &html, config.chunking.max_tokens, counter.as_ref())?;
        println!("ingest {} (dry-run)", url);
        println!("  html bytes: {}", html.len());
        println!("  tokenizer: {}", counter.name());
        println!("  chunks: {}", chunks.len());
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let outcome = ingest_html(config, &pool, url, &html).await?;

    println!("ingest {}", url);
    println!("  page: {}", outcome.page_id);
    if let Some(ref title) = outcome.title {
        println!("  title: {}", title);
    }
    println!("  chunks written: {}", outcome.chunks_written);
    if config.embedding.is_enabled() {
        println!("  embeddings written: {}", outcome.embeddings_written);
        println!("  embeddings pending: {}", outcome.embeddings_pending);
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Chunk and store one page's HTML under `url`.
///
/// Used by both the CLI and the HTTP server. An empty chunk list is a
/// valid outcome (nothing to index), not an error.
pub async fn ingest_html(
    config: &Config,
    pool: &SqlitePool,
    url: &str,
    html: &str,
) -> Result<IngestOutcome> {
    let title = extract::document_title(html);
    let page_id = upsert_page(pool, url, title.as_deref(), html).await?;

    let counter = tokenizer::create_counter(&config.tokenizer)?;
    let chunks = chunk_page(&page_id, html, config.chunking.max_tokens, counter.as_ref())?;
    replace_chunks(pool, &page_id, &chunks).await?;

    // Inline embedding (non-fatal)
    let (embedded, pending) = embed_cmd::embed_chunks_inline(config, pool, &chunks).await;

    Ok(IngestOutcome {
        page_id,
        title,
        chunks_written: chunks.len() as u64,
        embeddings_written: embedded,
        embeddings_pending: pending,
    })
}

async fn upsert_page(
    pool: &SqlitePool,
    url: &str,
    title: Option<&str>,
    html: &str,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(html.as_bytes());
    let content_hash = format!("{:x}", hasher.finalize());

    let existing_id: Option<String> = sqlx::query_scalar("SELECT id FROM pages WHERE url = ?")
        .bind(url)
        .fetch_optional(pool)
        .await?;

    let page_id = existing_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO pages (id, url, title, fetched_at, body, content_hash)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(url) DO UPDATE SET
            title = excluded.title,
            fetched_at = excluded.fetched_at,
            body = excluded.body,
            content_hash = excluded.content_hash
        "#,
    )
    .bind(&page_id)
    .bind(url)
    .bind(title)
    .bind(now)
    .bind(html)
    .bind(&content_hash)
    .execute(pool)
    .await?;

    Ok(page_id)
}

async fn replace_chunks(pool: &SqlitePool, page_id: &str, chunks: &[Chunk]) -> Result<()> {
    let mut tx = pool.begin().await?;

    // Delete old embeddings for this page's chunks
    sqlx::query(
        "DELETE FROM chunk_vectors WHERE chunk_id IN (SELECT id FROM chunks WHERE page_id = ?)",
    )
    .bind(page_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "DELETE FROM embeddings WHERE chunk_id IN (SELECT id FROM chunks WHERE page_id = ?)",
    )
    .bind(page_id)
    .execute(&mut *tx)
    .await?;

    // Delete old chunks
    sqlx::query("DELETE FROM chunks WHERE page_id = ?")
        .bind(page_id)
        .execute(&mut *tx)
        .await?;

    // Insert new chunks
    for chunk in chunks {
        sqlx::query(
            "INSERT INTO chunks (id, page_id, chunk_index, text, html, path, hash) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&chunk.id)
        .bind(&chunk.page_id)
        .bind(chunk.chunk_index)
        .bind(&chunk.text)
        .bind(&chunk.html)
        .bind(&chunk.path)
        .bind(&chunk.hash)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
