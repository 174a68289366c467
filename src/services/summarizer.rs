use crate::{
    config::Config,
    error::{ApiError, Result},
    models::ExtractedContent,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const EXCERPT_CHARS: usize = 2000;

/// Text-generation backend that turns a prompt into prose.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

pub fn build_prompt(content: &ExtractedContent) -> String {
    let excerpt: String = content
        .text_blocks
        .join("\n")
        .chars()
        .take(EXCERPT_CHARS)
        .collect();

    format!(
        "Analyze this web content and provide a detailed report:\n\n\
         Title: {}\n\
         Description: {}\n\n\
         Content Summary:\n{}\n\n\
         Please provide:\n\
         1. Content Type Analysis (what kind of page is this)\n\
         2. Key Topics and Themes\n\
         3. Advertising Potential\n\
         4. Engagement Metrics Analysis\n\n\
         Format as bullet points.",
        content.title, content.description, excerpt
    )
}

pub fn fallback_analysis(content: &ExtractedContent) -> String {
    let title = if content.title.trim().is_empty() {
        "Untitled page"
    } else {
        content.title.trim()
    };
    format!(
        "Unable to generate AI analysis. Here's what we found:\n\
         • Page Title: {}\n\
         • Content Length: {} sections\n\
         • Basic web page analysis available",
        title,
        content.text_blocks.len()
    )
}

/// Always yields text: the generated analysis, or the local fallback.
pub async fn analyze(summarizer: Option<&dyn Summarizer>, content: &ExtractedContent) -> String {
    let Some(summarizer) = summarizer else {
        return fallback_analysis(content);
    };

    match summarizer.summarize(&build_prompt(content)).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("summarizer returned empty text");
            fallback_analysis(content)
        }
        Err(e) => {
            warn!(error = %e, "summarizer failed, using fallback analysis");
            fallback_analysis(content)
        }
    }
}

// ============================================================================
// Gemini generateContent
// ============================================================================

pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<GenerateContent<'a>>,
}

#[derive(Serialize)]
struct GenerateContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiSummarizer {
    pub fn new(
        http: reqwest::Client,
        api_base: String,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            api_base,
            model,
            api_key,
            timeout,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Option<Self> {
        let key = config.gemini_api_key.clone().filter(|k| !k.is_empty())?;
        Some(Self::new(
            http,
            config.gemini_api_base.clone(),
            config.gemini_model.clone(),
            key,
            Duration::from_secs(config.summarizer_timeout),
        ))
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let body = GenerateRequest {
            contents: vec![GenerateContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Summarizer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::Summarizer(format!("status {}: {}", status, detail)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Summarizer(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ApiError::Summarizer("no candidates returned".into()));
        }

        info!(model = %self.model, chars = text.len(), "summary generated");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn content() -> ExtractedContent {
        ExtractedContent {
            title: "Summer Sale".into(),
            description: "Everything must go".into(),
            text_blocks: vec!["First block of text".into(), "Second block".into()],
            images: Vec::new(),
            social_proof: false,
        }
    }

    struct Broken;

    #[async_trait]
    impl Summarizer for Broken {
        async fn summarize(&self, _: &str) -> Result<String> {
            Err(ApiError::Summarizer("quota exceeded".into()))
        }
    }

    struct Echo;

    #[async_trait]
    impl Summarizer for Echo {
        async fn summarize(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", prompt.len()))
        }
    }

    #[test]
    fn test_prompt_contains_page_facts() {
        let prompt = build_prompt(&content());
        assert!(prompt.contains("Title: Summer Sale"));
        assert!(prompt.contains("Description: Everything must go"));
        assert!(prompt.contains("First block of text\nSecond block"));
        assert!(prompt.contains("Advertising Potential"));
    }

    #[test]
    fn test_prompt_excerpt_is_bounded() {
        let mut c = content();
        c.text_blocks = vec!["~".repeat(5000)];
        let prompt = build_prompt(&c);
        assert_eq!(prompt.matches('~').count(), EXCERPT_CHARS);
    }

    #[tokio::test]
    async fn test_failure_falls_back_with_title() {
        let text = analyze(Some(&Broken), &content()).await;
        assert!(text.contains("Summer Sale"));
        assert!(text.contains("2 sections"));
    }

    #[tokio::test]
    async fn test_missing_summarizer_falls_back() {
        let text = analyze(None, &ExtractedContent::placeholder()).await;
        assert!(text.contains("Untitled page"));
        assert!(text.contains("1 sections"));
    }

    #[tokio::test]
    async fn test_success_is_returned_verbatim() {
        let text = analyze(Some(&Echo), &content()).await;
        assert!(text.starts_with("echo: "));
    }

    #[tokio::test]
    async fn test_gemini_response_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "• Retail landing page" }] }
                }]
            })))
            .mount(&server)
            .await;

        let gemini = GeminiSummarizer::new(
            reqwest::Client::new(),
            server.uri(),
            "gemini-test".into(),
            "k".into(),
            Duration::from_secs(5),
        );
        let text = gemini.summarize("prompt").await.unwrap();
        assert_eq!(text, "• Retail landing page");
    }

    #[tokio::test]
    async fn test_gemini_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let gemini = GeminiSummarizer::new(
            reqwest::Client::new(),
            server.uri(),
            "gemini-test".into(),
            "k".into(),
            Duration::from_secs(5),
        );
        assert!(matches!(
            gemini.summarize("prompt").await,
            Err(ApiError::Summarizer(_))
        ));
    }
}
