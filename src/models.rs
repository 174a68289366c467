use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query string shared by the scrape and export endpoints.
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub url: String,
    pub alt: String,
}

/// Structured content pulled out of one fetched page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    pub title: String,
    pub description: String,
    pub text_blocks: Vec<String>,
    pub images: Vec<ImageRef>,
    /// review, rating or testimonial markup was present
    pub social_proof: bool,
}

pub const PLACEHOLDER_TEXT: &str =
    "Unable to directly scrape content. Generating sample analysis.";

impl ExtractedContent {
    /// Stand-in used when the page could not be fetched, so later stages
    /// always see well-formed content.
    pub fn placeholder() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            text_blocks: vec![PLACEHOLDER_TEXT.to_string()],
            images: Vec::new(),
            social_proof: false,
        }
    }

    pub fn joined_text(&self) -> String {
        self.text_blocks.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Ecommerce,
    Social,
    Blog,
    General,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Ecommerce => "ecommerce",
            ContentCategory::Social => "social",
            ContentCategory::Blog => "blog",
            ContentCategory::General => "general",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic page quality, always within [`QualityScore::MIN`, `QualityScore::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct QualityScore(f64);

impl QualityScore {
    pub const MIN: f64 = 0.3;
    pub const MAX: f64 = 1.5;

    pub fn new(raw: f64) -> Self {
        if raw.is_nan() {
            return Self(Self::MIN);
        }
        Self(raw.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Synthesized engagement numbers for one page.
///
/// Every derived field is computed in [`MetricsSnapshot::derive`], so the
/// click and conversion equations always hold together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub conversions: u64,
    pub conversion_rate: f64,
    pub engagement_rate: f64,
}

impl MetricsSnapshot {
    pub fn derive(impressions: u64, ctr: f64, conversion_rate: f64) -> Self {
        let ctr = round2(ctr.max(0.0));
        let conversion_rate = conversion_rate.max(0.0);
        let clicks = (impressions as f64 * ctr / 100.0).floor() as u64;
        let conversions = (clicks as f64 * conversion_rate / 100.0).floor() as u64;
        let engagement_rate = if impressions == 0 {
            0.0
        } else {
            round2(clicks as f64 / impressions as f64 * 100.0)
        };

        Self {
            impressions,
            clicks,
            ctr,
            conversions,
            conversion_rate,
            engagement_rate,
        }
    }

    pub fn empty() -> Self {
        Self::derive(0, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Instagram,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMetrics {
    pub platform: Platform,
    /// views for videos, followers for profiles
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub engagement_rate: f64,
}

impl SocialMetrics {
    pub fn from_counts(platform: Platform, views: u64, likes: u64, comments: u64) -> Self {
        let engagement_rate = if views == 0 {
            0.0
        } else {
            round2((likes + comments) as f64 / views as f64 * 100.0)
        };
        Self {
            platform,
            views,
            likes,
            comments,
            engagement_rate,
        }
    }

    pub fn zeroed(platform: Platform) -> Self {
        Self::from_counts(platform, 0, 0, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementBreakdown {
    pub impressions: u64,
    pub clicks: u64,
    pub engagement: u64,
    pub shares: u64,
    pub comments: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub daily: Vec<u64>,
    pub weekly: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    #[serde(rename = "18-24")]
    pub age_18_24: u32,
    #[serde(rename = "25-34")]
    pub age_25_34: u32,
    #[serde(rename = "35-44")]
    pub age_35_44: u32,
    #[serde(rename = "45-54")]
    pub age_45_54: u32,
    #[serde(rename = "55+")]
    pub age_55_plus: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSplit {
    #[serde(rename = "Mobile (Android)")]
    pub android: u32,
    #[serde(rename = "Mobile (iOS)")]
    pub ios: u32,
    #[serde(rename = "Desktop (Windows)")]
    pub windows: u32,
    #[serde(rename = "Desktop (Mac)")]
    pub mac: u32,
    #[serde(rename = "Tablet")]
    pub tablet: u32,
    #[serde(rename = "Other")]
    pub other: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialBreakdown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<SocialMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<SocialMetrics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub engagement: EngagementBreakdown,
    pub timeline: Timeline,
    pub demographics: Demographics,
    pub devices: DeviceSplit,
    pub social_metrics: SocialBreakdown,
    pub category: ContentCategory,
    pub quality_score: QualityScore,
}

/// Everything produced for one URL; this is what the cache stores.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub url: String,
    pub content: ExtractedContent,
    pub category: ContentCategory,
    pub quality: QualityScore,
    pub metrics: MetricsSnapshot,
    pub analytics: Analytics,
    pub social: Option<SocialMetrics>,
    pub analysis: String,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn title(&self) -> &str {
        &self.content.title
    }
}

/// Wire shape of `/scrape`. Always sent with HTTP 200.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub status: bool,
    pub data: Vec<String>,
    pub metrics: MetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Analytics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cached: bool,
    pub server_status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_score_clamps() {
        assert_eq!(QualityScore::new(0.0).value(), QualityScore::MIN);
        assert_eq!(QualityScore::new(9.0).value(), QualityScore::MAX);
        assert_eq!(QualityScore::new(0.5).value(), 0.5);
        assert_eq!(QualityScore::new(f64::NAN).value(), QualityScore::MIN);
    }

    #[test]
    fn test_snapshot_derives_consistent_fields() {
        let m = MetricsSnapshot::derive(12_345, 3.456, 2.5);
        assert_eq!(m.ctr, 3.46);
        assert_eq!(m.clicks, (12_345.0_f64 * 3.46 / 100.0).floor() as u64);
        assert_eq!(m.conversions, (m.clicks as f64 * 2.5 / 100.0).floor() as u64);
        assert_eq!(
            m.engagement_rate,
            round2(m.clicks as f64 / m.impressions as f64 * 100.0)
        );
    }

    #[test]
    fn test_empty_snapshot_has_no_nan() {
        let m = MetricsSnapshot::empty();
        assert_eq!(m.clicks, 0);
        assert_eq!(m.engagement_rate, 0.0);
    }

    #[test]
    fn test_social_engagement_rate() {
        let s = SocialMetrics::from_counts(Platform::YouTube, 1000, 40, 10);
        assert_eq!(s.engagement_rate, 5.0);
        assert_eq!(SocialMetrics::zeroed(Platform::Instagram).engagement_rate, 0.0);
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let json = serde_json::to_string(&ContentCategory::Ecommerce).unwrap();
        assert_eq!(json, "\"ecommerce\"");
    }
}
