pub mod analytics;
pub mod cache;
pub mod classifier;
pub mod content;
pub mod export;
pub mod metrics;
pub mod pipeline;
pub mod random;
pub mod social;
pub mod summarizer;
pub mod validator;
