//! One-shot sheet download.
//!
//! A sheet is fetched once per run. Any transport error or non-success
//! status fails the run; there are no retries.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

/// GETs `url` and returns the body. Non-2xx statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    let bytes = resp.bytes().await?.to_vec();
    debug!(url, bytes = bytes.len(), "Fetched sheet");
    Ok(bytes)
}

/// Loads sheet bytes from a local path, or over HTTP for `http(s)://` sources.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("fetching {source}"))
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_source_reads_file() {
        let path = format!("{}/swim_cuts_test_source.csv", std::env::temp_dir().display());
        std::fs::write(&path, "Name\nAlice\n").unwrap();

        let bytes = load_source(&BasicClient::new(), &path).await.unwrap();
        assert_eq!(bytes, b"Name\nAlice\n");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_source_missing_file_fails() {
        let result = load_source(&BasicClient::new(), "/nonexistent/swims.csv").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_bad_url() {
        let result = fetch_bytes(&BasicClient::new(), "not a url").await;
        assert!(result.is_err());
    }
}
