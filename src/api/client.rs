use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use super::error::ApiError;
use super::types::{FeedPage, ItemId, LikeResponse, MuteRequest};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the feed, like and mute endpoints.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base: String,
}

impl FeedClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base(base: &str) -> Result<Self> {
        Self::new(base, DEFAULT_TIMEOUT)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `GET /api/feed?count=<n>`
    pub async fn fetch_feed(&self, count: usize) -> Result<FeedPage, ApiError> {
        let url = format!("{}/api/feed", self.base);
        let page: FeedPage = self
            .http
            .get(&url)
            .query(&[("count", count)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(
            requested = count,
            received = page.items.len(),
            has_more = page.has_more,
            "feed page"
        );
        Ok(page)
    }

    /// `POST /api/like/:id`. Only a 2xx response with `status == "success"`
    /// and an action counts as success.
    pub async fn toggle_like(&self, id: &ItemId) -> Result<LikeResponse, ApiError> {
        let url = format!("{}/api/like/{}", self.base, id);
        let response: LikeResponse = self
            .http
            .post(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !response.is_success() {
            let reason = response
                .message
                .clone()
                .unwrap_or_else(|| format!("status {}", response.status));
            return Err(ApiError::Rejected(reason));
        }
        Ok(response)
    }

    /// `POST /api/mute` with `{"is_muted": bool}`.
    pub async fn set_mute(&self, is_muted: bool) -> Result<(), ApiError> {
        let url = format!("{}/api/mute", self.base);
        self.http
            .post(&url)
            .json(&MuteRequest { is_muted })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
