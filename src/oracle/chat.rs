//! OpenAI-compatible chat-completions adapter. Serves the `openai`,
//! `deepseek` and `dashscope` providers, which differ only in URL and key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Oracle, OracleError};
use crate::config::AgentConfig;

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

pub struct ChatOracle {
    url: &'static str,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl ChatOracle {
    pub fn new(url: &'static str, api_key: String, agent: &AgentConfig) -> Self {
        Self {
            url,
            api_key,
            model: agent.model.clone(),
            temperature: agent.temperature,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn invoke(&self, instructions: &str, message: &str) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: instructions.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: message.to_string(),
                },
            ],
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
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

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|err| OracleError::Api {
            status: status.as_u16(),
            message: format!("unparseable response: {}", err),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(OracleError::EmptyResponse)
    }
}

/// Truncate a string for error messages (Unicode-safe).
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_unicode_safe() {
        assert_eq!(truncate("ééééé", 3), "ééé");
        assert_eq!(truncate("short", 300), "short");
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }
}
