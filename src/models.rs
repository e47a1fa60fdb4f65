//! Core data models used throughout websift.
//!
//! These types represent the pages, chunks, and search results that flow
//! through the ingestion and retrieval pipeline.

/// A fetched web page stored in SQLite.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Page {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub fetched_at: i64,
    /// Raw HTML as fetched.
    pub body: String,
    pub content_hash: String,
}

/// A token-bounded segment of a page, the unit that gets embedded and indexed.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub page_id: String,
    pub chunk_index: i64,
    /// Accumulated sentence text, never empty.
    pub text: String,
    /// Best-effort HTML snippet for highlighting; may be empty and is not
    /// guaranteed to cover exactly `text`.
    pub html: String,
    /// Structural locator (`tag#id.class1.class2`) of the block the chunk
    /// started in, or `"/"` for the whole-document fallback.
    pub path: String,
    pub hash: String,
}

/// A ranked search hit returned from the query pipeline.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SearchResult {
    pub url: String,
    pub path: String,
    pub text: String,
    pub html: String,
    /// Relevance as a 0–100 percentage, min–max scaled over the result set.
    pub score: f64,
}
