use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create pages table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pages (
            id TEXT PRIMARY KEY,
            url TEXT NOT NULL UNIQUE,
            title TEXT,
            fetched_at INTEGER NOT NULL,
            body TEXT NOT NULL,
            content_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create chunks table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            page_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            html TEXT NOT NULL DEFAULT '',
            path TEXT NOT NULL DEFAULT '/',
            hash TEXT NOT NULL,
            UNIQUE(page_id, chunk_index),
            FOREIGN KEY (page_id) REFERENCES pages(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Embedding bookkeeping: which model/hash each chunk was embedded with
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS embeddings (
            chunk_id TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            hash TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Vector storage: little-endian f32 BLOBs, one row per embedded chunk
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunk_vectors (
            chunk_id TEXT PRIMARY KEY,
            page_id TEXT NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_page_id ON chunks(page_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunk_vectors_page_id ON chunk_vectors(page_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_pages_fetched_at ON pages(fetched_at DESC)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
