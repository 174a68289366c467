// src/services/content.rs
use crate::{
    config::Config,
    error::{ApiError, Result},
    models::{ExtractedContent, ImageRef},
};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Html, Selector};
use std::{sync::OnceLock, time::Duration};
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const TEXT_SELECTOR: &str = r#"p, h1, h2, h3, article, .content, [class*="content"]"#;
const SOCIAL_PROOF_SELECTOR: &str = r#"[class*="review"], [class*="rating"], [class*="testimonial"], [itemprop="aggregateRating"]"#;
const AD_IMAGE_TOKENS: &[&str] = &["ad", "banner", "promotion"];

const MIN_BLOCK_CHARS: usize = 20;
const BODY_FALLBACK_CHARS: usize = 1000;
const EMPTY_BODY_TEXT: &str = "No readable text content was found on this page.";

/// Fetches pages with a browser-like identity and turns them into
/// [`ExtractedContent`].
pub struct Extractor {
    http: reqwest::Client,
}

impl Extractor {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.fetch_timeout))
            .redirect(reqwest::redirect::Policy::limited(config.fetch_max_redirects))
            .build()
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        Ok(Self { http })
    }

    /// Only 2xx bodies are parsed; any other status or a transport error fails.
    pub async fn extract(&self, url: &Url) -> Result<ExtractedContent> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Fetch(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        debug!(%url, "fetching page");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::Fetch(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(ApiError::UpstreamStatus(status));
        }

        let base = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| ApiError::Fetch(e.to_string()))?;

        let content = parse_document(&html, &base);
        info!(
            %url,
            status,
            blocks = content.text_blocks.len(),
            images = content.images.len(),
            "extracted page content"
        );

        Ok(content)
    }
}

/// Pure markup-to-content step of the extractor.
pub fn parse_document(html: &str, base: &Url) -> ExtractedContent {
    let document = Html::parse_document(html);

    let title = select_first(&document, "title")
        .map(|el| normalize(&el.text().collect::<String>()))
        .unwrap_or_default();

    let description = select_first(&document, r#"meta[name="description"]"#)
        .and_then(|el| el.value().attr("content"))
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    ExtractedContent {
        title,
        description,
        text_blocks: collect_text_blocks(&document),
        images: collect_images(&document, base),
        social_proof: has_social_proof(&document),
    }
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text_blocks(document: &Html) -> Vec<String> {
    let mut blocks = Vec::new();

    if let Ok(selector) = Selector::parse(TEXT_SELECTOR) {
        for element in document.select(&selector) {
            let text = normalize(&element.text().collect::<String>());
            if text.chars().count() > MIN_BLOCK_CHARS {
                blocks.push(text);
            }
        }
    }

    if blocks.is_empty() {
        let body: String = select_first(document, "body")
            .map(|el| normalize(&el.text().collect::<String>()))
            .unwrap_or_default()
            .chars()
            .take(BODY_FALLBACK_CHARS)
            .collect();

        if body.is_empty() {
            blocks.push(EMPTY_BODY_TEXT.to_string());
        } else {
            blocks.push(body);
        }
    }

    blocks
}

fn background_url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).expect("background url regex is valid")
    })
}

fn collect_images(document: &Html, base: &Url) -> Vec<ImageRef> {
    let mut images: Vec<ImageRef> = Vec::new();
    let mut push = |image: ImageRef| {
        if !images.iter().any(|existing| existing.url == image.url) {
            images.push(image);
        }
    };

    if let Ok(selector) = Selector::parse("img") {
        for element in document.select(&selector) {
            let Some(src) = element.value().attr("src") else {
                continue;
            };
            let lowered = src.to_lowercase();
            if !AD_IMAGE_TOKENS.iter().any(|token| lowered.contains(token)) {
                continue;
            }
            if let Some(url) = resolve(base, src) {
                let alt = element
                    .value()
                    .attr("alt")
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .unwrap_or("Advertisement Image");
                push(ImageRef {
                    url,
                    alt: alt.to_string(),
                });
            }
        }
    }

    if let Ok(selector) = Selector::parse(r#"[style*="background"]"#) {
        for element in document.select(&selector) {
            let Some(style) = element.value().attr("style") else {
                continue;
            };
            for captures in background_url_pattern().captures_iter(style) {
                if let Some(url) = captures.get(1).and_then(|m| resolve(base, m.as_str())) {
                    push(ImageRef {
                        url,
                        alt: "Background Advertisement Image".to_string(),
                    });
                }
            }
        }
    }

    images
}

fn resolve(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with("data:") {
        return None;
    }
    base.join(reference).ok().map(|u| u.to_string())
}

fn has_social_proof(document: &Html) -> bool {
    Selector::parse(SOCIAL_PROOF_SELECTOR)
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false)
}
