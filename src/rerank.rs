//! Cross-encoder re-ranking provider abstraction.
//!
//! Vector similarity gets candidates in the door; a cross-encoder scores
//! each (query, text) pair jointly and usually orders the top of the list
//! better. Defines the [`RerankProvider`] trait and implementations:
//! - **[`DisabledReranker`]** — results keep their vector-similarity order.
//! - **[`JinaReranker`]** — calls a Jina-compatible `/rerank` endpoint
//!   (hosted API or a self-hosted server speaking the same contract).
//!
//! Scoring is batched and retried with the same backoff policy as the
//! embedding providers.

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::RerankConfig;

const DEFAULT_JINA_ENDPOINT: &str = "https://api.jina.ai/v1/rerank";

/// Trait for re-ranking providers.
///
/// The actual scoring is performed by [`rerank_texts`] (kept as a free
/// function due to async trait limitations).
pub trait RerankProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"jina-reranker-v2-base-multilingual"`).
    fn model_name(&self) -> &str;
}

/// A no-op reranker used when `rerank.provider = "disabled"`.
pub struct DisabledReranker;

impl RerankProvider for DisabledReranker {
    fn model_name(&self) -> &str {
        "disabled"
    }
}

/// Reranker calling a Jina-compatible HTTP API.
///
/// Requires the `JINA_API_KEY` environment variable unless a custom
/// `endpoint` points at an unauthenticated self-hosted server.
pub struct JinaReranker {
    model: String,
}

impl JinaReranker {
    pub fn new(config: &RerankConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("rerank.model required for Jina provider"))?;

        if config.endpoint.is_none() && std::env::var("JINA_API_KEY").is_err() {
            bail!("JINA_API_KEY environment variable not set");
        }

        Ok(Self { model })
    }
}

impl RerankProvider for JinaReranker {
    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Score `texts` against `query` with the configured provider.
///
/// Returns one relevance score per input text, in input order. The
/// `disabled` provider is an error here — callers are expected to check
/// [`RerankConfig::is_enabled`] and skip re-ranking entirely.
pub async fn rerank_texts(
    provider: &dyn RerankProvider,
    config: &RerankConfig,
    query: &str,
    texts: &[String],
) -> Result<Vec<f32>> {
    match config.provider.as_str() {
        "jina" => rerank_jina(config, provider.model_name(), query, texts).await,
        "disabled" => bail!("Rerank provider is disabled"),
        other => bail!("Unknown rerank provider: {}", other),
    }
}

async fn rerank_jina(
    config: &RerankConfig,
    model: &str,
    query: &str,
    texts: &[String],
) -> Result<Vec<f32>> {
    let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_JINA_ENDPOINT);
    let api_key = std::env::var("JINA_API_KEY").ok();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let mut scores = Vec::with_capacity(texts.len());
    for batch in texts.chunks(config.batch_size.max(1)) {
        let batch_scores =
            rerank_batch(&client, config, endpoint, api_key.as_deref(), model, query, batch)
                .await?;
        scores.extend(batch_scores);
    }
    Ok(scores)
}

async fn rerank_batch(
    client: &reqwest::Client,
    config: &RerankConfig,
    endpoint: &str,
    api_key: Option<&str>,
    model: &str,
    query: &str,
    texts: &[String],
) -> Result<Vec<f32>> {
    let body = serde_json::json!({
        "model": model,
        "query": query,
        "documents": texts,
    });

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(endpoint).json(&body);
        if let Some(key) = api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_rerank_response(&json, texts.len());
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "Rerank API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                // Client error (not 429) — don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("Rerank API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Rerank failed after retries")))
}

/// Parse a rerank response, mapping `results[].relevance_score` back to
/// input order via `results[].index`. Texts the server omitted score 0.
fn parse_rerank_response(json: &serde_json::Value, expected: usize) -> Result<Vec<f32>> {
    let results = json
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid rerank response: missing results array"))?;

    let mut scores = vec![0.0f32; expected];
    for item in results {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .ok_or_else(|| anyhow::anyhow!("Invalid rerank response: missing index"))?
            as usize;
        let score = item
            .get("relevance_score")
            .and_then(|s| s.as_f64())
            .ok_or_else(|| anyhow::anyhow!("Invalid rerank response: missing relevance_score"))?;

        if index >= expected {
            bail!("Invalid rerank response: index {} out of range", index);
        }
        scores[index] = score as f32;
    }

    Ok(scores)
}

/// Create the appropriate [`RerankProvider`] based on configuration.
pub fn create_reranker(config: &RerankConfig) -> Result<Box<dyn RerankProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledReranker)),
        "jina" => Ok(Box::new(JinaReranker::new(config)?)),
        other => bail!("Unknown rerank provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_maps_scores_back_to_input_order() {
        let json = serde_json::json!({
            "results": [
                {"index": 1, "relevance_score": 0.9},
                {"index": 0, "relevance_score": 0.2},
            ]
        });
        let scores = parse_rerank_response(&json, 2).unwrap();
        assert_eq!(scores, vec![0.2, 0.9]);
    }

    #[test]
    fn parse_defaults_omitted_texts_to_zero() {
        let json = serde_json::json!({
            "results": [{"index": 2, "relevance_score": 0.5}]
        });
        let scores = parse_rerank_response(&json, 3).unwrap();
        assert_eq!(scores, vec![0.0, 0.0, 0.5]);
    }

    #[test]
    fn parse_rejects_out_of_range_index() {
        let json = serde_json::json!({
            "results": [{"index": 5, "relevance_score": 0.5}]
        });
        assert!(parse_rerank_response(&json, 2).is_err());
    }

    #[test]
    fn parse_rejects_missing_results() {
        assert!(parse_rerank_response(&serde_json::json!({}), 1).is_err());
    }
}
