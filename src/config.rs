use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "adlens")]
#[command(about = "Ad analytics API server", long_about = None)]
pub struct Config {
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SERVER_PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// upper bound for a whole scrape, after which a fallback payload is returned
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout: u64,

    #[arg(long, env = "CORS_ORIGINS", default_value = "")]
    pub cors_origins: String,

    // page fetching
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "15")]
    pub fetch_timeout: u64,

    #[arg(long, env = "FETCH_MAX_REDIRECTS", default_value = "5")]
    pub fetch_max_redirects: usize,

    // metrics cache
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "3600")]
    pub cache_ttl: u64,

    #[arg(long, env = "CACHE_SWEEP_SECS", default_value = "3600")]
    pub cache_sweep_interval: u64,

    #[arg(long, env = "EXPORTS_DIR", default_value = "exports")]
    pub exports_dir: String,

    // gemini summarizer
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    #[arg(
        long,
        env = "GEMINI_API_BASE",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_api_base: String,

    #[arg(long, env = "SUMMARIZER_TIMEOUT_SECS", default_value = "30")]
    pub summarizer_timeout: u64,

    // social platforms
    #[arg(long, env = "YOUTUBE_API_KEY")]
    pub youtube_api_key: Option<String>,

    #[arg(
        long,
        env = "YOUTUBE_API_BASE",
        default_value = "https://www.googleapis.com/youtube/v3"
    )]
    pub youtube_api_base: String,

    #[arg(long, env = "INSTAGRAM_ACCESS_TOKEN")]
    pub instagram_access_token: Option<String>,

    #[arg(
        long,
        env = "INSTAGRAM_API_BASE",
        default_value = "https://graph.instagram.com"
    )]
    pub instagram_api_base: String,

    #[arg(long, env = "SOCIAL_TIMEOUT_SECS", default_value = "10")]
    pub social_timeout: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn gemini_configured(&self) -> bool {
        self.gemini_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn youtube_configured(&self) -> bool {
        self.youtube_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn instagram_configured(&self) -> bool {
        self.instagram_access_token
            .as_deref()
            .is_some_and(|k| !k.is_empty())
    }
}
