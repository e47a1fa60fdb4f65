//! Database statistics and health overview.
//!
//! Provides a quick summary of what's indexed: page counts, chunk counts,
//! and embedding coverage, with a per-page breakdown. Used by
//! `websift stats` to confirm ingests and embeddings are working.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-page breakdown of chunk counts and embedding coverage.
struct PageStats {
    url: String,
    chunk_count: i64,
    embedded_count: i64,
    fetched_at: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_pages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages")
        .fetch_one(&pool)
        .await?;

    let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
        .fetch_one(&pool)
        .await?;

    let total_embedded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("websift — Database Stats");
    println!("========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Pages:       {}", total_pages);
    println!("  Chunks:      {}", total_chunks);
    println!(
        "  Embedded:    {} / {} ({}%)",
        total_embedded,
        total_chunks,
        if total_chunks > 0 {
            (total_embedded * 100) / total_chunks
        } else {
            0
        }
    );

    // Per-page breakdown
    let page_rows = sqlx::query(
        r#"
        SELECT
            p.url,
            p.fetched_at,
            COUNT(DISTINCT c.id) AS chunk_count,
            COUNT(DISTINCT cv.chunk_id) AS embedded_count
        FROM pages p
        LEFT JOIN chunks c ON c.page_id = p.id
        LEFT JOIN chunk_vectors cv ON cv.chunk_id = c.id
        GROUP BY p.id
        ORDER BY p.fetched_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let page_stats: Vec<PageStats> = page_rows
        .iter()
        .map(|row| PageStats {
            url: row.get("url"),
            chunk_count: row.get("chunk_count"),
            embedded_count: row.get("embedded_count"),
            fetched_at: row.get("fetched_at"),
        })
        .collect();

    if !page_stats.is_empty() {
        println!();
        println!("  By page:");
        println!(
            "  {:<48} {:>8} {:>10}   {}",
            "URL", "CHUNKS", "EMBEDDED", "FETCHED"
        );
        println!("  {}", "-".repeat(84));

        for s in &page_stats {
            println!(
                "  {:<48} {:>8} {:>10}   {}",
                truncate(&s.url, 48),
                s.chunk_count,
                s.embedded_count,
                format_ts_relative(s.fetched_at)
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_scales() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn truncate_preserves_short_urls() {
        assert_eq!(truncate("https://a.example", 48), "https://a.example");
        let long = "x".repeat(60);
        let t = truncate(&long, 48);
        assert!(t.ends_with("..."));
        assert_eq!(t.chars().count(), 48);
    }
}
