use crate::{
    config::Config,
    error::{ApiError, Result},
    models::{AnalysisReport, ExtractedContent},
    services::{
        analytics, classifier,
        cache::MetricsCache,
        content::Extractor,
        metrics::MetricsSynthesizer,
        random::{RandomSource, StdRandom},
        social::SocialEnricher,
        summarizer::{self, GeminiSummarizer, Summarizer},
        validator,
    },
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

pub enum ScrapeOutcome {
    Fresh(Arc<AnalysisReport>),
    Cached(Arc<AnalysisReport>),
    /// page could not be fetched; metrics were built from placeholder content
    Degraded {
        report: Arc<AnalysisReport>,
        reason: String,
    },
}

impl ScrapeOutcome {
    pub fn report(&self) -> &Arc<AnalysisReport> {
        match self {
            Self::Fresh(report) | Self::Cached(report) => report,
            Self::Degraded { report, .. } => report,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

pub struct Pipeline {
    extractor: Extractor,
    synthesizer: MetricsSynthesizer,
    cache: Arc<MetricsCache>,
    social: SocialEnricher,
    summarizer: Option<Arc<dyn Summarizer>>,
    rng: Arc<dyn RandomSource>,
}

impl Pipeline {
    pub fn new(
        extractor: Extractor,
        cache: Arc<MetricsCache>,
        social: SocialEnricher,
        summarizer: Option<Arc<dyn Summarizer>>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            extractor,
            synthesizer: MetricsSynthesizer::new(rng.clone()),
            cache,
            social,
            summarizer,
            rng,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let summarizer = GeminiSummarizer::from_config(config, api_http.clone())
            .map(|g| Arc::new(g) as Arc<dyn Summarizer>);

        Ok(Self::new(
            Extractor::new(config)?,
            Arc::new(MetricsCache::new(Duration::from_secs(config.cache_ttl))),
            SocialEnricher::from_config(config, api_http),
            summarizer,
            Arc::new(StdRandom::from_entropy()),
        ))
    }

    pub fn cache(&self) -> &Arc<MetricsCache> {
        &self.cache
    }

    /// Report built from placeholder content alone, with no network calls.
    /// Used when the full analysis cannot finish in time; never cached.
    pub fn placeholder_report(&self, raw_url: &str) -> Result<Arc<AnalysisReport>> {
        let url = validator::parse_url(raw_url)?;
        let content = ExtractedContent::placeholder();
        let (category, quality) = classifier::classify(&url, &content);
        let metrics = self.synthesizer.synthesize(category, quality);
        let analytics = analytics::build(
            &metrics,
            &content,
            category,
            quality,
            None,
            self.rng.as_ref(),
        );
        let analysis = summarizer::fallback_analysis(&content);

        Ok(Arc::new(AnalysisReport {
            url: url.to_string(),
            content,
            category,
            quality,
            metrics,
            analytics,
            social: None,
            analysis,
            generated_at: Utc::now(),
        }))
    }

    /// Full analysis of one URL. Only malformed input is an error; every
    /// downstream failure degrades into a usable report.
    pub async fn analyze(&self, raw_url: &str) -> Result<ScrapeOutcome> {
        let url = validator::parse_url(raw_url)?;
        let key = url.as_str().to_string();

        if let Some(entry) = self.cache.get(&key).await {
            info!(url = %key, age_secs = (Utc::now() - entry.created_at).num_seconds(), "cache hit");
            return Ok(ScrapeOutcome::Cached(entry.report));
        }

        let (content, failure) = match self.extractor.extract(&url).await {
            Ok(content) => (content, None),
            Err(e) => {
                warn!(url = %key, error = %e, "extraction failed, using placeholder content");
                (ExtractedContent::placeholder(), Some(e.to_string()))
            }
        };

        let (category, quality) = classifier::classify(&url, &content);
        let metrics = self.synthesizer.synthesize(category, quality);

        let (social, analysis) = tokio::join!(
            self.social.enrich(&url),
            summarizer::analyze(self.summarizer.as_deref(), &content),
        );

        let analytics = analytics::build(
            &metrics,
            &content,
            category,
            quality,
            social.as_ref(),
            self.rng.as_ref(),
        );

        let report = Arc::new(AnalysisReport {
            url: key.clone(),
            content,
            category,
            quality,
            metrics,
            analytics,
            social,
            analysis,
            generated_at: Utc::now(),
        });

        info!(
            url = %key,
            category = category.as_str(),
            quality = quality.value(),
            impressions = report.metrics.impressions,
            "analysis complete"
        );

        Ok(match failure {
            Some(reason) => ScrapeOutcome::Degraded { report, reason },
            None => {
                self.cache.put(&key, report.clone()).await;
                ScrapeOutcome::Fresh(report)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentCategory;
    use crate::services::cache::{tests::report, CacheEntry};
    use crate::services::random::FixedRandom;
    use url::Url;
    use async_trait::async_trait;
    use clap::Parser;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Canned;

    #[async_trait]
    impl Summarizer for Canned {
        async fn summarize(&self, _: &str) -> Result<String> {
            Ok("canned analysis".into())
        }
    }

    fn pipeline(summarizer: Option<Arc<dyn Summarizer>>) -> Pipeline {
        let config = Config::parse_from(["adlens", "--fetch-timeout", "2"]);
        Pipeline::new(
            Extractor::new(&config).unwrap(),
            Arc::new(MetricsCache::new(Duration::from_secs(3600))),
            SocialEnricher::new(Vec::new(), Duration::from_secs(1)),
            summarizer,
            Arc::new(FixedRandom(0.5)),
        )
    }

    const SHOP_PAGE: &str = r#"<html><head><title>Gadget Store</title></head><body>
        <p>Browse every product in our store with free shipping on all orders.</p>
        <p>Add to cart and buy today, the best price guaranteed for members.</p>
        </body></html>"#;

    #[tokio::test]
    async fn test_invalid_url_short_circuits() {
        let p = pipeline(None);
        assert!(matches!(
            p.analyze("not a url").await,
            Err(ApiError::InvalidUrl)
        ));
        assert!(p.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shop"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let p = pipeline(Some(Arc::new(Canned)));
        let url = format!("{}/shop", server.uri());

        let first = p.analyze(&url).await.unwrap();
        assert!(matches!(first, ScrapeOutcome::Fresh(_)));
        assert_eq!(first.report().category, ContentCategory::Ecommerce);
        assert_eq!(first.report().analysis, "canned analysis");

        let second = p.analyze(&url).await.unwrap();
        assert!(second.is_cached());
        assert!(Arc::ptr_eq(first.report(), second.report()));
    }

    #[tokio::test]
    async fn test_unreachable_page_degrades_and_is_not_cached() {
        let p = pipeline(None);
        let outcome = p.analyze("http://127.0.0.1:1/").await.unwrap();

        let ScrapeOutcome::Degraded { report, reason } = &outcome else {
            panic!("expected a degraded outcome");
        };
        assert!(!reason.is_empty());
        assert!(report.metrics.impressions > 0);
        assert!(report.analysis.contains("Unable to generate AI analysis"));
        assert!(p.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_server_error_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let p = pipeline(None);
        let outcome = p.analyze(&server.uri()).await.unwrap();
        assert!(matches!(outcome, ScrapeOutcome::Degraded { .. }));
    }

    #[tokio::test]
    async fn test_not_found_page_degrades_and_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                "<html><head><title>404 Not Found</title></head><body></body></html>",
            ))
            .mount(&server)
            .await;

        let p = pipeline(None);
        let outcome = p.analyze(&format!("{}/gone", server.uri())).await.unwrap();

        let ScrapeOutcome::Degraded { report, reason } = &outcome else {
            panic!("expected a degraded outcome");
        };
        assert!(reason.contains("404"));
        assert!(report.title().is_empty());
        assert!(p.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_fresh_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shop"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let p = pipeline(None);
        let url = format!("{}/shop", server.uri());
        let key = Url::parse(&url).unwrap().to_string();
        let stale = report(&key, 1);
        p.cache()
            .insert(CacheEntry {
                key: key.clone(),
                report: stale.clone(),
                created_at: Utc::now() - chrono::Duration::hours(2),
            })
            .await;

        let outcome = p.analyze(&url).await.unwrap();
        assert!(matches!(outcome, ScrapeOutcome::Fresh(_)));
        assert!(!Arc::ptr_eq(outcome.report(), &stale));
        assert_eq!(outcome.report().category, ContentCategory::Ecommerce);

        let cached = p.cache().get(&key).await.unwrap();
        assert!(Arc::ptr_eq(&cached.report, outcome.report()));
    }

    #[tokio::test]
    async fn test_placeholder_report_has_synthesized_metrics() {
        let p = pipeline(None);
        let report = p.placeholder_report("https://example.com/slow").unwrap();

        assert!(report.metrics.impressions > 0);
        assert!(report.metrics.ctr > 0.0);
        assert!(report.analysis.contains("Unable to generate AI analysis"));
        assert!(p.cache().is_empty().await);
        assert!(matches!(
            p.placeholder_report("nope"),
            Err(ApiError::InvalidUrl)
        ));
    }
}
