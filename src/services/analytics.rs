use crate::{
    models::{
        Analytics, ContentCategory, Demographics, DeviceSplit, EngagementBreakdown,
        ExtractedContent, MetricsSnapshot, Platform, QualityScore, SocialBreakdown,
        SocialMetrics, Timeline,
    },
    services::random::{uniform, RandomSource},
};

const ENGAGEMENT_RATIO: f64 = 0.03;
const SHARE_RATIO: f64 = 0.01;
const COMMENT_RATIO: f64 = 0.005;
/// ±10% around the base value
const TIMELINE_VARIANCE: f64 = 0.2;
const DAILY_POINTS: usize = 7;
const WEEKLY_POINTS: usize = 4;

pub fn build(
    metrics: &MetricsSnapshot,
    content: &ExtractedContent,
    category: ContentCategory,
    quality: QualityScore,
    social: Option<&SocialMetrics>,
    rng: &dyn RandomSource,
) -> Analytics {
    Analytics {
        engagement: engagement(metrics),
        timeline: timeline(metrics.impressions, rng),
        demographics: demographics(&content.joined_text()),
        devices: device_split(),
        social_metrics: social_breakdown(social),
        category,
        quality_score: quality,
    }
}

pub fn engagement(metrics: &MetricsSnapshot) -> EngagementBreakdown {
    let impressions = metrics.impressions as f64;
    EngagementBreakdown {
        impressions: metrics.impressions,
        clicks: metrics.clicks,
        engagement: (impressions * ENGAGEMENT_RATIO).floor() as u64,
        shares: (impressions * SHARE_RATIO).floor() as u64,
        comments: (impressions * COMMENT_RATIO).floor() as u64,
    }
}

pub fn timeline(impressions: u64, rng: &dyn RandomSource) -> Timeline {
    let weekly_base = impressions as f64;
    let daily_base = weekly_base / DAILY_POINTS as f64;
    Timeline {
        daily: series(daily_base, DAILY_POINTS, rng),
        weekly: series(weekly_base, WEEKLY_POINTS, rng),
    }
}

fn series(base: f64, points: usize, rng: &dyn RandomSource) -> Vec<u64> {
    let half = TIMELINE_VARIANCE / 2.0;
    (0..points)
        .map(|_| (base * (1.0 + uniform(rng, -half, half))).floor().max(0.0) as u64)
        .collect()
}

/// Keyword guess at the audience age mix. Buckets with no signal get 5.
pub fn demographics(text: &str) -> Demographics {
    let text = text.to_lowercase();

    let mut d = Demographics {
        age_18_24: 0,
        age_25_34: 0,
        age_35_44: 0,
        age_45_54: 0,
        age_55_plus: 0,
    };

    if mentions(&text, &["game", "social", "trending"]) {
        d.age_18_24 += 30;
        d.age_25_34 += 25;
    }
    if mentions(&text, &["career", "professional", "job"]) {
        d.age_25_34 += 35;
        d.age_35_44 += 25;
    }
    if mentions(&text, &["investment", "property", "retirement"]) {
        d.age_35_44 += 30;
        d.age_45_54 += 25;
        d.age_55_plus += 20;
    }

    for bucket in [
        &mut d.age_18_24,
        &mut d.age_25_34,
        &mut d.age_35_44,
        &mut d.age_45_54,
        &mut d.age_55_plus,
    ] {
        if *bucket == 0 {
            *bucket = 5;
        }
    }

    d
}

fn mentions(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

pub fn device_split() -> DeviceSplit {
    DeviceSplit {
        android: 35,
        ios: 25,
        windows: 20,
        mac: 12,
        tablet: 6,
        other: 2,
    }
}

fn social_breakdown(social: Option<&SocialMetrics>) -> SocialBreakdown {
    let mut breakdown = SocialBreakdown::default();
    if let Some(metrics) = social {
        match metrics.platform {
            Platform::YouTube => breakdown.youtube = Some(metrics.clone()),
            Platform::Instagram => breakdown.instagram = Some(metrics.clone()),
        }
    }
    breakdown
}
