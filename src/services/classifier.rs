use crate::models::{ContentCategory, ExtractedContent, QualityScore};
use url::Url;

const COMMERCE_KEYWORDS: &[&str] = &["shop", "product", "store", "price", "buy"];
const LONG_FORM_KEYWORDS: &[&str] = &["blog", "article"];
const SOCIAL_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "instagram.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "linkedin.com",
    "pinterest.com",
    "reddit.com",
];

const LONG_FORM_BLOCKS: usize = 5;
const RICH_TEXT_CHARS: usize = 500;
const QUALITY_INDICATORS: f64 = 6.0;

pub fn classify(url: &Url, content: &ExtractedContent) -> (ContentCategory, QualityScore) {
    (categorize(url, content), quality_score(content))
}

pub fn categorize(url: &Url, content: &ExtractedContent) -> ContentCategory {
    let url_text = url_signal_text(url);
    let headline = format!("{} {}", content.title, content.description).to_lowercase();

    let commerce_in_url = contains_any(&url_text, COMMERCE_KEYWORDS);
    let commerce_in_headline = contains_any(&headline, COMMERCE_KEYWORDS);
    // body copy mentions "buy" or "price" in passing, so one hit is not enough
    let commerce_in_body = distinct_hits(&content.joined_text().to_lowercase(), COMMERCE_KEYWORDS) >= 2;

    if commerce_in_url || commerce_in_headline || commerce_in_body {
        return ContentCategory::Ecommerce;
    }

    if is_social_host(url) {
        return ContentCategory::Social;
    }

    if contains_any(&url_text, LONG_FORM_KEYWORDS)
        || contains_any(&content.title.to_lowercase(), LONG_FORM_KEYWORDS)
        || content.text_blocks.len() > LONG_FORM_BLOCKS
    {
        return ContentCategory::Blog;
    }

    ContentCategory::General
}

/// Fraction of satisfied quality indicators, clamped into the score range.
pub fn quality_score(content: &ExtractedContent) -> QualityScore {
    let joined = content.joined_text();
    let all_text = format!("{} {} {}", content.title, content.description, joined).to_lowercase();

    let indicators = [
        !content.title.trim().is_empty(),
        !content.description.trim().is_empty(),
        !content.images.is_empty(),
        joined.chars().count() > RICH_TEXT_CHARS,
        contains_any(&all_text, COMMERCE_KEYWORDS),
        content.social_proof,
    ];

    let satisfied = indicators.iter().filter(|&&hit| hit).count() as f64;
    QualityScore::new(satisfied / QUALITY_INDICATORS)
}

pub fn is_social_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_lowercase();
    SOCIAL_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{}", known)))
}

fn url_signal_text(url: &Url) -> String {
    format!(
        "{} {} {}",
        url.host_str().unwrap_or_default(),
        url.path(),
        url.query().unwrap_or_default()
    )
    .to_lowercase()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn distinct_hits(haystack: &str, needles: &[&str]) -> usize {
    needles.iter().filter(|n| haystack.contains(*n)).count()
}
