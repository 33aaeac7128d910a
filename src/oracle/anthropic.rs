//! Anthropic messages-API adapter. Same capability as the chat adapter,
//! different wire shape: instructions travel in a top-level `system` field
//! and the reply is a list of content blocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::chat::truncate;
use super::{Oracle, OracleError};
use crate::config::AgentConfig;

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

pub struct AnthropicOracle {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl AnthropicOracle {
    pub fn new(api_key: String, agent: &AgentConfig) -> Self {
        Self {
            api_key,
            model: agent.model.clone(),
            temperature: agent.temperature,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    async fn invoke(&self, instructions: &str, message: &str) -> Result<String, OracleError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            system: instructions.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: message.to_string(),
            }],
            max_tokens: MAX_TOKENS,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
                message: truncate(&text, 300),
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|err| OracleError::Api {
                status: status.as_u16(),
                message: format!("unparseable response: {}", err),
            })?;

        let content = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            Err(OracleError::EmptyResponse)
        } else {
            Ok(content)
        }
    }
}
