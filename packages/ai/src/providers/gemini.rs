//! Google Gemini provider implementation.

use serde::{Deserialize, Serialize};

use super::{CANDIDATE_COUNT, InsightProvider, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::AiError;

/// Model used when `AI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini `generateContent` provider.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

/// Gemini API request body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    candidate_count: u32,
    max_output_tokens: u32,
}

/// Gemini API response body.
#[derive(Deserialize)]
struct GeminiResponse {
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
    text: Option<String>,
}

/// Gemini API error response.
#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Extracts `candidates[0].content.parts[0].text` from a success body.
fn parse_success(body: &str) -> Result<String, AiError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| AiError::SchemaMismatch {
            message: format!("Gemini response is not a generateContent reply: {e}"),
        })?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| AiError::SchemaMismatch {
            message: "missing candidates[0].content.parts[0].text".to_string(),
        })
}

fn parse_error(status: reqwest::StatusCode, body: &str) -> AiError {
    let message = serde_json::from_str::<GeminiError>(body)
        .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message);
    AiError::Provider { message }
}

#[async_trait::async_trait]
impl InsightProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let request = GeminiRequest {
            contents: [GeminiContent {
                parts: [GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                candidate_count: CANDIDATE_COUNT,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!("{BASE_URL}/{}:generateContent", self.model);
        log::debug!("Requesting Gemini completion from {}", self.model);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
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
    fn reads_first_candidate_part() {
        let body = r#"{
            "candidates": [
                { "content": { "parts": [{ "text": "Overall store density:\nHigh." }, { "text": "ignored" }], "role": "model" } },
                { "content": { "parts": [{ "text": "second candidate" }] } }
            ]
        }"#;
        assert_eq!(parse_success(body).unwrap(), "Overall store density:\nHigh.");
    }

    #[test]
    fn missing_candidates_is_schema_mismatch() {
        let err =
            parse_success(r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#).unwrap_err();
        assert!(matches!(err, AiError::SchemaMismatch { .. }));
    }

    #[test]
    fn legacy_content_text_is_not_accepted() {
        let body = r#"{ "candidates": [{ "content": { "text": "old shape" } }] }"#;
        assert!(matches!(
            parse_success(body),
            Err(AiError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn non_json_is_schema_mismatch() {
        assert!(matches!(
            parse_success("<html>"),
            Err(AiError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let err = parse_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{ "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" } }"#,
        );
        match err {
            AiError::Provider { message } => assert_eq!(message, "API key not valid"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn request_uses_camel_case_generation_config() {
        let request = GeminiRequest {
            contents: [GeminiContent {
                parts: [GeminiPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                candidate_count: CANDIDATE_COUNT,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["candidateCount"], 1);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
    }
}
