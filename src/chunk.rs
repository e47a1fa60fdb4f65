//! Token-bounded HTML chunker.
//!
//! Splits a page's extracted [`Block`]s into [`Chunk`]s whose text never
//! exceeds a configurable token budget. Sentences are accumulated greedily;
//! a sentence too large for the budget on its own is sub-split word by
//! word. Each chunk carries a best-effort HTML snippet and the structural
//! path of the block it started in, and near-duplicate chunks (same
//! lowercase 200-character prefix) are dropped.
//!
//! Each chunk receives a UUID plus a SHA-256 hash of its text so the
//! embedding backfill can detect staleness.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use uuid::Uuid;

use crate::extract::{self, Block};
use crate::models::Chunk;
use crate::tokenizer::TokenCounter;

/// Case-folded prefix length used as the dedup key.
const DEDUP_PREFIX_CHARS: usize = 200;

/// Chunking failure. The chunker itself never fails on malformed input;
/// the only error source is its token-counting dependency.
#[derive(Debug)]
pub enum ChunkError {
    DependencyUnavailable(String),
}

impl std::fmt::Display for ChunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkError::DependencyUnavailable(msg) => {
                write!(f, "token counter unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for ChunkError {}

/// Chunk an HTML document into token-bounded, path-annotated chunks.
///
/// Returns chunks with contiguous indices starting at 0. An empty result
/// means there was nothing to index, not an error; the only failure mode
/// is an unavailable token counter.
pub fn chunk_page(
    page_id: &str,
    html: &str,
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Result<Vec<Chunk>, ChunkError> {
    let blocks = extract::extract_blocks(html);
    let pieces = accumulate(&blocks, max_tokens, counter)?;
    let pieces = dedup_by_prefix(pieces);

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| make_chunk(page_id, index as i64, piece))
        .collect())
}

/// A chunk-in-progress before it is assigned an id and index.
#[derive(Debug, Clone, PartialEq)]
struct Piece {
    text: String,
    html: String,
    path: String,
}

/// Split text into sentences at `.`/`?`/`!` followed by whitespace.
///
/// The terminator stays attached to the preceding sentence; empty results
/// are discarded. Deliberately naive about abbreviations and decimals;
/// chunk boundaries downstream are defined relative to this exact rule.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = iter.peek() {
                if next.is_whitespace() {
                    let end = i + c.len_utf8();
                    let sentence = text[start..end].trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence);
                    }
                    start = end;
                }
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Greedy token-bounded accumulation across block sentences.
///
/// The emitted HTML for a flush is the most recently appended fragment,
/// not a merge: text accumulates fully, HTML stays best-effort.
fn accumulate<'a>(
    blocks: &'a [Block],
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Result<Vec<Piece>, ChunkError> {
    let mut pieces = Vec::new();
    let mut current_text = String::new();
    let mut current_html_parts: Vec<&'a str> = Vec::new();
    let mut current_path = "/".to_string();

    for block in blocks {
        for sentence in split_sentences(&block.text) {
            let candidate = if current_text.is_empty() {
                sentence.to_string()
            } else {
                format!("{} {}", current_text, sentence)
            };

            if counter.count(&candidate)? <= max_tokens {
                current_text = candidate;
                if !block.html.is_empty() {
                    current_html_parts.push(&block.html);
                }
                if current_path == "/" {
                    current_path = block.path.clone();
                }
                continue;
            }

            // Overflow: flush whatever has accumulated so far.
            if !current_text.is_empty() {
                let html = current_html_parts
                    .last()
                    .copied()
                    .unwrap_or(block.html.as_str());
                pieces.push(Piece {
                    text: std::mem::take(&mut current_text),
                    html: html.to_string(),
                    path: current_path.clone(),
                });
            }

            if counter.count(sentence)? > max_tokens {
                // The sentence alone blows the budget: sub-split on words.
                // A sentence this long always starts and ends its own group.
                split_words(sentence, block, max_tokens, counter, &mut pieces)?;
                current_text.clear();
                current_html_parts.clear();
                current_path = "/".to_string();
            } else {
                current_text = sentence.to_string();
                current_html_parts.clear();
                if !block.html.is_empty() {
                    current_html_parts.push(&block.html);
                }
                current_path = block.path.clone();
            }
        }
    }

    if !current_text.is_empty() {
        let html = current_html_parts.last().copied().unwrap_or("");
        pieces.push(Piece {
            text: current_text,
            html: html.to_string(),
            path: current_path,
        });
    }

    Ok(pieces)
}

/// Word-wise sub-split for a sentence that exceeds the budget by itself.
///
/// A single word larger than the budget is emitted oversized rather than
/// split mid-word.
fn split_words(
    sentence: &str,
    block: &Block,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    pieces: &mut Vec<Piece>,
) -> Result<(), ChunkError> {
    let mut part = String::new();

    for word in sentence.split_whitespace() {
        let candidate = if part.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", part, word)
        };

        if counter.count(&candidate)? <= max_tokens {
            part = candidate;
        } else {
            if !part.is_empty() {
                pieces.push(Piece {
                    text: std::mem::take(&mut part),
                    html: block.html.clone(),
                    path: block.path.clone(),
                });
            }
            part = word.to_string();
        }
    }

    if !part.is_empty() {
        pieces.push(Piece {
            text: part,
            html: block.html.clone(),
            path: block.path.clone(),
        });
    }

    Ok(())
}

/// Drop pieces whose lowercase 200-character prefix was already seen,
/// keeping the first occurrence in order.
fn dedup_by_prefix(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(pieces.len());

    for piece in pieces {
        let key: String = piece
            .text
            .chars()
            .take(DEDUP_PREFIX_CHARS)
            .collect::<String>()
            .to_lowercase();
        if seen.insert(key) {
            kept.push(piece);
        }
    }
    kept
}

fn make_chunk(page_id: &str, index: i64, piece: Piece) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(piece.text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        page_id: page_id.to_string(),
        chunk_index: index,
        text: piece.text,
        html: piece.html,
        path: piece.path,
        hash,
    }
}
