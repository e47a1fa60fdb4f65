//! Page retrieval by ID.
//!
//! Fetches a stored page and its chunks from the database. Used by the
//! `websift get` CLI command.

use anyhow::{bail, Result};
use serde::Serialize;
use sqlx::Row;

use crate::config::Config;
use crate::db;

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub fetched_at: String, // ISO8601
    pub content_hash: String,
    pub chunks: Vec<ChunkResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkResponse {
    pub index: i64,
    pub path: String,
    pub text: String,
}

/// Core get function returning structured data.
pub async fn get_page(config: &Config, id: &str) -> Result<PageResponse> {
    let pool = db::connect(config).await?;

    let page_row = sqlx::query("SELECT id, url, title, fetched_at, content_hash FROM pages WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?;

    let page_row = match page_row {
        Some(row) => row,
        None => {
            pool.close().await;
            bail!("page not found: {}", id);
        }
    };

    let fetched_at: i64 = page_row.get("fetched_at");

    let chunk_rows = sqlx::query(
        "SELECT chunk_index, path, text FROM chunks WHERE page_id = ? ORDER BY chunk_index ASC",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let chunks: Vec<ChunkResponse> = chunk_rows
        .iter()
        .map(|row| ChunkResponse {
            index: row.get("chunk_index"),
            path: row.get("path"),
            text: row.get("text"),
        })
        .collect();

    pool.close().await;

    Ok(PageResponse {
        id: page_row.get("id"),
        url: page_row.get("url"),
        title: page_row.get("title"),
        fetched_at: format_ts_iso(fetched_at),
        content_hash: page_row.get("content_hash"),
        chunks,
    })
}

/// CLI entry point — calls get_page and prints to stdout.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let page = match get_page(config, id).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("--- Page ---");
    println!("id:           {}", page.id);
    println!("url:          {}", page.url);
    println!(
        "title:        {}",
        page.title.as_deref().unwrap_or("(untitled)")
    );
    println!("fetched_at:   {}", page.fetched_at);
    println!("content_hash: {}", page.content_hash);
    println!();

    println!("--- Chunks ({}) ---", page.chunks.len());
    for chunk in &page.chunks {
        println!("[chunk {} @ {}]", chunk.index, chunk.path);
        println!("{}", chunk.text);
        println!();
    }

    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
