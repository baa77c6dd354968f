use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::models::Reply;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// POST the final reply to the one-time callback URL from the inbound
/// command. Not retried: the platform accepts a callback URL only a few times.
pub async fn deliver(client: &reqwest::Client, response_url: &str, reply: &Reply) -> Result<()> {
    let url = Url::parse(response_url).context("Invalid response_url")?;
    if url.scheme() != "https" && url.scheme() != "http" {
        anyhow::bail!("Only http(s) response URLs are allowed, got {}", url.scheme());
    }

    let resp = client
        .post(url)
        .timeout(DELIVERY_TIMEOUT)
        .json(reply)
        .send()
        .await
        .context("Failed to reach response_url")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("response_url returned {status}: {body}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_http_scheme() {
        let err = deliver(
            &reqwest::Client::new(),
            "file:///etc/passwd",
            &Reply::private("x"),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Only http(s)"));
    }

    #[tokio::test]
    async fn test_rejects_garbage_url() {
        let err = deliver(&reqwest::Client::new(), "not a url", &Reply::private("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid response_url"));
    }
}
