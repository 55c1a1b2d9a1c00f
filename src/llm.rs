//! Single-shot relay to an OpenAI-compatible chat-completion endpoint.
//!
//! One outbound request per message: the configured persona prompt plus
//! the user's message, no conversation memory, no streaming, no retry.

use crate::{config::Llm as LlmConfig, log_internal};
use anyhow::{anyhow, Result};
use std::time::Duration;

/// Discord rejects messages over 2000 characters; clip a bit under that.
const REPLY_CHAR_LIMIT: usize = 1900;

#[derive(serde::Serialize)]
pub struct ChatRequest {
    /// LLM model name
    model: String,
    /// Whether to stream one token at a time, or return entire response in one go
    stream: bool,
    /// Persona prompt followed by the single user message.
    messages: Vec<ChatMessage>,
    /// Bounds the response length
    max_tokens: u32,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ChatMessage {
    role: ChatMessageRole,
    content: String,
}

#[allow(non_camel_case_types)] // Serialized literally; case matters
#[derive(serde::Serialize, serde::Deserialize)]
enum ChatMessageRole {
    system,
    user,
    assistant,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatRequest {
    pub fn single_turn(cfg: &LlmConfig, user_message: &str) -> Self {
        Self {
            model: cfg.model_name.clone(),
            stream: false,
            max_tokens: cfg.max_tokens,
            messages: vec![
                ChatMessage {
                    role: ChatMessageRole::system,
                    content: cfg.system.clone(),
                },
                ChatMessage {
                    role: ChatMessageRole::user,
                    content: user_message.to_owned(),
                },
            ],
        }
    }

    /// Post the request and return the reply text.  The client carries a
    /// bounded timeout so a stalled upstream never blocks the event loop
    /// indefinitely.
    pub async fn post(&self, cfg: &LlmConfig) -> Result<String> {
        let url = cfg.api_url.as_str();

        log_internal!("Sending request to chat endpoint {}... ", url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()?;
        let response = client
            .post(url)
            .bearer_auth(&cfg.api_key)
            .json(self)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;
        log_internal!("Sending request to chat endpoint {}... done", url);

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(anyhow!("Chat endpoint returned no choices"))?;
        let content = content.trim();

        if content.chars().count() > REPLY_CHAR_LIMIT {
            return Ok(content.chars().take(REPLY_CHAR_LIMIT).collect());
        }

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            api_url: "http://localhost:9999/v1/chat/completions".to_string(),
            api_key: "test-key".to_string(),
            model_name: "test-model".to_string(),
            system: "You are a shark maid.".to_string(),
            max_tokens: 100,
            timeout_seconds: 30,
            channel_id: 1,
        }
    }

    #[test]
    fn single_turn_puts_persona_before_the_message() {
        let request = ChatRequest::single_turn(&test_config(), "hello there");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "test-model");
        assert_eq!(value["stream"], false);
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "You are a shark maid.");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "hello there");
    }

    #[test]
    fn response_shape_deserializes() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.choices[0].message.content, "hi");
    }
}
