//! HTML retrieval for the ingest pipeline.

use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::config::FetchConfig;

/// Fetch a page over HTTP(S) and return its body as text.
///
/// Non-2xx responses are errors; the body is not inspected for
/// content-type — the chunker degrades gracefully on non-HTML input.
pub async fn fetch_page(config: &FetchConfig, url: &str) -> Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("URL must be http:// or https://: {}", url);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(&config.user_agent)
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()
        .with_context(|| format!("Fetch failed for {}", url))?;

    response
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let config = FetchConfig::default();
        let err = fetch_page(&config, "ftp://example.com/page").await.unwrap_err();
        assert!(err.to_string().contains("http"));
    }
}
