//! Anthropic Claude provider implementation.

use serde::{Deserialize, Serialize};

use super::{InsightProvider, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::AiError;

/// Model used when `AI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic Claude API provider.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

/// Anthropic API request body.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [AnthropicMessage<'a>; 1],
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Anthropic API response body.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Anthropic API error response.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Extracts the first `text` content block from a success body.
fn parse_success(body: &str) -> Result<String, AiError> {
    let response: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| AiError::SchemaMismatch {
            message: format!("Anthropic response is not a messages reply: {e}"),
        })?;

    response
        .content
        .into_iter()
        .find_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .ok_or_else(|| AiError::SchemaMismatch {
            message: "no text block in content".to_string(),
        })
}

fn parse_error(status: reqwest::StatusCode, body: &str) -> AiError {
    let message = serde_json::from_str::<AnthropicError>(body)
        .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message);
    AiError::Provider { message }
}

#[async_trait::async_trait]
impl InsightProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            messages: [AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        log::debug!("Requesting Anthropic completion from {}", self.model);

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        parse_success(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_text_block() {
        let body = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "Cluster highlights:\nCluster 1 is dense." },
                { "type": "text", "text": "second block" }
            ],
            "stop_reason": "end_turn"
        }"#;
        assert_eq!(
            parse_success(body).unwrap(),
            "Cluster highlights:\nCluster 1 is dense."
        );
    }

    #[test]
    fn no_text_block_is_schema_mismatch() {
        let body = r#"{ "content": [] }"#;
        assert!(matches!(
            parse_success(body),
            Err(AiError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn gemini_shape_is_schema_mismatch() {
        let body = r#"{ "candidates": [{ "content": { "parts": [{ "text": "x" }] } }] }"#;
        assert!(matches!(
            parse_success(body),
            Err(AiError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let err = parse_error(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{ "type": "error", "error": { "type": "authentication_error", "message": "invalid x-api-key" } }"#,
        );
        assert!(matches!(err, AiError::Provider { message } if message == "invalid x-api-key"));
    }

    #[test]
    fn unparseable_error_body_keeps_status() {
        let err = parse_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(
            matches!(err, AiError::Provider { message } if message.starts_with("HTTP 502"))
        );
    }
}
