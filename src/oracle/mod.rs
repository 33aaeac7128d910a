//! Oracle client boundary
//!
//! The repair stages see exactly one capability: send a pair of
//! (instructions, message) strings, get text back. Which backend answers is
//! decided once, from configuration, when the adapter is built - the stages
//! never branch on a provider name.

mod anthropic;
mod chat;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::AgentConfig;

pub use anthropic::AnthropicOracle;
pub use chat::ChatOracle;

/// Errors crossing the oracle boundary. All of them are fatal to the
/// session; nothing here is retried.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("no API key configured: set {0}")]
    MissingApiKey(&'static str),

    #[error("unsupported provider '{0}' (expected openai, anthropic, deepseek or dashscope)")]
    UnknownProvider(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response contained no content")]
    EmptyResponse,
}

/// A text-generation backend. One operation, blocking round trip, no
/// streaming, no memory across calls.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn invoke(&self, instructions: &str, message: &str) -> Result<String, OracleError>;
}

/// Build the adapter named by the config. The API key comes from the
/// provider's environment variable; a missing key fails here, before any
/// session work starts.
pub fn build(agent: &AgentConfig) -> Result<Box<dyn Oracle>, OracleError> {
    info!(
        "oracle provider={} model={} temperature={}",
        agent.provider, agent.model, agent.temperature
    );

    match agent.provider.as_str() {
        "openai" => Ok(Box::new(ChatOracle::new(
            "https://api.openai.com/v1/chat/completions",
            env_key("OPENAI_API_KEY")?,
            agent,
        ))),
        "deepseek" => Ok(Box::new(ChatOracle::new(
            "https://api.deepseek.com/v1/chat/completions",
            env_key("DEEPSEEK_API_KEY")?,
            agent,
        ))),
        "dashscope" => Ok(Box::new(ChatOracle::new(
            "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
            env_key("DASHSCOPE_API_KEY")?,
            agent,
        ))),
        "anthropic" => Ok(Box::new(AnthropicOracle::new(
            env_key("ANTHROPIC_API_KEY")?,
            agent,
        ))),
        other => Err(OracleError::UnknownProvider(other.to_string())),
    }
}

fn env_key(var: &'static str) -> Result<String, OracleError> {
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(OracleError::MissingApiKey(var))
}
