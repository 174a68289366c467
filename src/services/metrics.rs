//! Simulated ad metrics.
//!
//! Real ad-platform numbers are not available, so each page gets plausible,
//! category-shaped figures drawn from calibrated ranges and scaled by the
//! page's quality score. The draws are random; the derived fields are not.

use crate::{
    models::{ContentCategory, MetricsSnapshot, QualityScore},
    services::random::{uniform, RandomSource},
};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

const fn range(min: f64, max: f64) -> Range {
    Range { min, max }
}

/// Base ranges for one content category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProfile {
    pub impressions: Range,
    /// percent
    pub ctr: Range,
    /// percent of clicks
    pub conversion_rate: Range,
}

pub fn profile(category: ContentCategory) -> CategoryProfile {
    match category {
        ContentCategory::Ecommerce => CategoryProfile {
            impressions: range(15_000.0, 60_000.0),
            ctr: range(2.5, 5.0),
            conversion_rate: range(2.0, 5.0),
        },
        ContentCategory::Social => CategoryProfile {
            impressions: range(20_000.0, 100_000.0),
            ctr: range(1.5, 3.5),
            conversion_rate: range(0.5, 2.0),
        },
        ContentCategory::Blog => CategoryProfile {
            impressions: range(5_000.0, 30_000.0),
            ctr: range(1.0, 3.0),
            conversion_rate: range(0.5, 1.5),
        },
        ContentCategory::General => CategoryProfile {
            impressions: range(5_000.0, 25_000.0),
            ctr: range(0.8, 2.5),
            conversion_rate: range(0.3, 1.2),
        },
    }
}

pub struct MetricsSynthesizer {
    rng: Arc<dyn RandomSource>,
}

impl MetricsSynthesizer {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }

    pub fn synthesize(&self, category: ContentCategory, quality: QualityScore) -> MetricsSnapshot {
        let profile = profile(category);
        let q = quality.value();

        let base_impressions = uniform(
            self.rng.as_ref(),
            profile.impressions.min,
            profile.impressions.max,
        );
        let base_ctr = uniform(self.rng.as_ref(), profile.ctr.min, profile.ctr.max);
        let base_conversion = uniform(
            self.rng.as_ref(),
            profile.conversion_rate.min,
            profile.conversion_rate.max,
        );

        let impressions = (base_impressions * (1.0 + q * 0.5)).floor() as u64;
        let ctr = base_ctr * (1.0 + q * 0.1);

        let snapshot = MetricsSnapshot::derive(impressions, ctr, base_conversion);
        debug!(
            %category,
            quality = q,
            impressions = snapshot.impressions,
            ctr = snapshot.ctr,
            "synthesized metrics"
        );
        snapshot
    }
}
