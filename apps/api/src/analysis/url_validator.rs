//! Link liveness checks for course recommendations.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode, Url};
use tracing::debug;

/// Bounded wait for a single liveness check.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REDIRECTS: usize = 10;

#[async_trait]
pub trait UrlValidator: Send + Sync {
    /// True iff the link is live right now. Never retries.
    async fn is_reachable(&self, url: &str) -> bool;
}

/// HEAD-request validator: live iff the final response (after redirects) is 200.
#[derive(Clone)]
pub struct HttpUrlValidator {
    client: Client,
}

impl HttpUrlValidator {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .context("Failed to build URL validation HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlValidator for HttpUrlValidator {
    async fn is_reachable(&self, url: &str) -> bool {
        let parsed = match Url::parse(url.trim()) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            _ => {
                debug!("Rejecting malformed course URL: {url}");
                return false;
            }
        };

        match self.client.head(parsed).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                debug!("Course URL {url} answered {}", response.status());
                false
            }
            Err(e) => {
                debug!("Course URL {url} unreachable: {e}");
                false
            }
        }
    }
}
