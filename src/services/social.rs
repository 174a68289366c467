//! Best-effort social platform statistics.
//!
//! A URL that points at a known platform post is mapped to a
//! [`SocialResource`] and handed to that platform's
//! [`SocialMetricsProvider`]. Enrichment never fails the request: any
//! provider error collapses into zeroed metrics.

use crate::{
    config::Config,
    error::{ApiError, Result},
    models::{Platform, SocialMetrics},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocialResource {
    YouTubeVideo(String),
    InstagramPost(String),
    InstagramProfile(String),
}

impl SocialResource {
    pub fn platform(&self) -> Platform {
        match self {
            SocialResource::YouTubeVideo(_) => Platform::YouTube,
            SocialResource::InstagramPost(_) | SocialResource::InstagramProfile(_) => {
                Platform::Instagram
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SocialResource::YouTubeVideo(id)
            | SocialResource::InstagramPost(id)
            | SocialResource::InstagramProfile(id) => id,
        }
    }
}

/// Paths on instagram.com that are not profile handles.
const INSTAGRAM_RESERVED: &[&str] = &["explore", "accounts", "stories", "direct", "about", "legal"];

pub fn detect_resource(url: &Url) -> Option<SocialResource> {
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match host {
        "youtube.com" => {
            if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
                return non_empty(&id).map(SocialResource::YouTubeVideo);
            }
            match segments.as_slice() {
                ["shorts" | "embed" | "live", id, ..] => {
                    non_empty(id).map(SocialResource::YouTubeVideo)
                }
                _ => None,
            }
        }
        "youtu.be" => segments
            .first()
            .and_then(|id| non_empty(id))
            .map(SocialResource::YouTubeVideo),
        "instagram.com" => match segments.as_slice() {
            ["p" | "reel" | "tv", code, ..] => non_empty(code).map(SocialResource::InstagramPost),
            [handle, ..] if !INSTAGRAM_RESERVED.contains(handle) => {
                non_empty(handle).map(SocialResource::InstagramProfile)
            }
            _ => None,
        },
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[async_trait]
pub trait SocialMetricsProvider: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch(&self, resource: &SocialResource) -> Result<SocialMetrics>;
}

/// Runs the matching provider and degrades every failure to zeroed metrics.
pub struct SocialEnricher {
    providers: Vec<Arc<dyn SocialMetricsProvider>>,
    timeout: Duration,
}

impl SocialEnricher {
    pub fn new(providers: Vec<Arc<dyn SocialMetricsProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let providers: Vec<Arc<dyn SocialMetricsProvider>> = vec![
            Arc::new(YouTubeProvider::new(
                http.clone(),
                config.youtube_api_base.clone(),
                config.youtube_api_key.clone(),
            )),
            Arc::new(InstagramProvider::new(
                http,
                config.instagram_api_base.clone(),
                config.instagram_access_token.clone(),
            )),
        ];
        Self::new(providers, Duration::from_secs(config.social_timeout))
    }

    /// `None` when the URL is not a recognised platform resource.
    pub async fn enrich(&self, url: &Url) -> Option<SocialMetrics> {
        let resource = detect_resource(url)?;
        let platform = resource.platform();

        let Some(provider) = self.providers.iter().find(|p| p.platform() == platform) else {
            return Some(SocialMetrics::zeroed(platform));
        };

        match tokio::time::timeout(self.timeout, provider.fetch(&resource)).await {
            Ok(Ok(metrics)) => {
                debug!(platform = platform.as_str(), id = resource.id(), "social metrics fetched");
                Some(metrics)
            }
            Ok(Err(e)) => {
                warn!(platform = platform.as_str(), error = %e, "social enrichment failed");
                Some(SocialMetrics::zeroed(platform))
            }
            Err(_) => {
                warn!(platform = platform.as_str(), "social enrichment timed out");
                Some(SocialMetrics::zeroed(platform))
            }
        }
    }
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.parse().ok()).unwrap_or(0)
}

// ============================================================================
// YouTube Data API v3
// ============================================================================

pub struct YouTubeProvider {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl YouTubeProvider {
    pub fn new(http: reqwest::Client, api_base: String, api_key: Option<String>) -> Self {
        Self {
            http,
            api_base,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    statistics: VideoStatistics,
}

// counts arrive as decimal strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[async_trait]
impl SocialMetricsProvider for YouTubeProvider {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    async fn fetch(&self, resource: &SocialResource) -> Result<SocialMetrics> {
        let SocialResource::YouTubeVideo(video_id) = resource else {
            return Err(ApiError::Enrichment("not a youtube video".into()));
        };
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ApiError::Enrichment("YOUTUBE_API_KEY not configured".into()))?;

        let url = format!("{}/videos", self.api_base.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("part", "statistics"), ("id", video_id.as_str()), ("key", key)])
            .send()
            .await
            .map_err(|e| ApiError::Enrichment(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Enrichment(format!("youtube api status {}", status)));
        }

        let body: VideoListResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Enrichment(e.to_string()))?;
        let stats = body
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Enrichment(format!("video {} not found", video_id)))?
            .statistics;

        Ok(SocialMetrics::from_counts(
            Platform::YouTube,
            parse_count(stats.view_count.as_deref()),
            parse_count(stats.like_count.as_deref()),
            parse_count(stats.comment_count.as_deref()),
        ))
    }
}

// ============================================================================
// Instagram Graph API
// ============================================================================

pub struct InstagramProvider {
    http: reqwest::Client,
    api_base: String,
    access_token: Option<String>,
}

impl InstagramProvider {
    pub fn new(http: reqwest::Client, api_base: String, access_token: Option<String>) -> Self {
        Self {
            http,
            api_base,
            access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstagramNode {
    like_count: Option<u64>,
    comments_count: Option<u64>,
    followers_count: Option<u64>,
}

#[async_trait]
impl SocialMetricsProvider for InstagramProvider {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn fetch(&self, resource: &SocialResource) -> Result<SocialMetrics> {
        let fields = match resource {
            SocialResource::InstagramPost(_) => "like_count,comments_count",
            SocialResource::InstagramProfile(_) => "followers_count,media_count",
            SocialResource::YouTubeVideo(_) => {
                return Err(ApiError::Enrichment("not an instagram resource".into()))
            }
        };
        let token = self
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Enrichment("INSTAGRAM_ACCESS_TOKEN not configured".into()))?;

        let url = format!("{}/{}", self.api_base.trim_end_matches('/'), resource.id());
        let response = self
            .http
            .get(&url)
            .query(&[("fields", fields), ("access_token", token)])
            .send()
            .await
            .map_err(|e| ApiError::Enrichment(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Enrichment(format!("instagram api status {}", status)));
        }

        let node: InstagramNode = response
            .json()
            .await
            .map_err(|e| ApiError::Enrichment(e.to_string()))?;

        Ok(SocialMetrics::from_counts(
            Platform::Instagram,
            node.followers_count.unwrap_or(0),
            node.like_count.unwrap_or(0),
            node.comments_count.unwrap_or(0),
        ))
    }
}
