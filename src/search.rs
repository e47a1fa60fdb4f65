//! Semantic search over indexed chunks.
//!
//! Pipeline: embed the query, rank stored vectors by cosine similarity,
//! optionally re-score the candidate pool with a cross-encoder, then
//! min–max scale the top-k scores to 0–100 for display.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::models::SearchResult;
use crate::rerank;

/// CLI entry point — runs the search and prints ranked results.
pub async fn run_search(config: &Config, query: &str, limit: Option<i64>) -> Result<()> {
    let pool = db::connect(config).await?;
    let k = limit.unwrap_or(config.retrieval.final_limit);
    let results = search_chunks(config, &pool, query, k).await?;
    pool.close().await;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, result.score, result.url);
        println!("    path: {}", result.path);
        println!(
            "    excerpt: \"{}\"",
            snippet(&result.text, 240).replace('\n', " ")
        );
        println!();
    }

    Ok(())
}

/// Core search returning ranked chunks (used by CLI and server).
///
/// An empty or whitespace query yields no results. Requires an enabled
/// embedding provider; re-ranking is applied only when configured.
pub async fn search_chunks(
    config: &Config,
    pool: &SqlitePool,
    query: &str,
    k: i64,
) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    if !config.embedding.is_enabled() {
        bail!("Search requires embeddings. Set [embedding] provider in config.");
    }
    let k = k.max(1) as usize;

    // Candidate pool: top cosine matches, at least 5× the requested size
    // so the re-ranker has something to reorder.
    let candidate_k = (config.retrieval.candidate_k as usize).max(k * 5);
    let mut candidates = fetch_vector_candidates(config, pool, query, candidate_k).await?;

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    if config.rerank.is_enabled() {
        let reranker = rerank::create_reranker(&config.rerank)?;
        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let scores = rerank::rerank_texts(reranker.as_ref(), &config.rerank, query, &texts).await?;
        for (candidate, score) in candidates.iter_mut().zip(scores) {
            candidate.score = score as f64;
        }
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(k);

    let percents = percent_scale(&candidates.iter().map(|c| c.score).collect::<Vec<_>>());

    Ok(candidates
        .into_iter()
        .zip(percents)
        .map(|(c, pct)| SearchResult {
            url: c.url,
            path: c.path,
            text: c.text,
            html: c.html,
            score: pct,
        })
        .collect())
}

#[derive(Debug, Clone)]
struct ChunkCandidate {
    url: String,
    path: String,
    text: String,
    html: String,
    score: f64,
}

/// Load all stored vectors and rank them by cosine similarity in-process.
async fn fetch_vector_candidates(
    config: &Config,
    pool: &SqlitePool,
    query: &str,
    candidate_k: usize,
) -> Result<Vec<ChunkCandidate>> {
    let provider = embedding::create_provider(&config.embedding)?;
    let query_vec = embedding::embed_query(provider.as_ref(), &config.embedding, query).await?;

    let rows = sqlx::query(
        r#"
        SELECT cv.embedding, c.text, c.html, c.path, p.url
        FROM chunk_vectors cv
        JOIN chunks c ON c.id = cv.chunk_id
        JOIN pages p ON p.id = cv.page_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut candidates: Vec<ChunkCandidate> = rows
        .iter()
        .map(|row| {
            let blob: Vec<u8> = row.get("embedding");
            let vec = embedding::blob_to_vec(&blob);
            let similarity = embedding::cosine_similarity(&query_vec, &vec) as f64;
            ChunkCandidate {
                url: row.get("url"),
                path: row.get("path"),
                text: row.get("text"),
                html: row.get("html"),
                score: similarity,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(candidate_k);

    Ok(candidates)
}

/// Min–max scale raw scores to 0–100 percentages over the result set.
///
/// Degenerate sets (all scores equal, including a single result) scale
/// against a range of 1.0 and land at 0%.
fn percent_scale(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    scores
        .iter()
        .map(|s| ((s - min) / range).clamp(0.0, 1.0) * 100.0)
        .collect()
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
