//! LLM provider abstraction and implementations.
//!
//! Supports Google Gemini and Anthropic Claude via a common trait. Each
//! provider reads exactly one documented response shape and reports
//! anything else as [`AiError::SchemaMismatch`].

pub mod anthropic;
pub mod gemini;

use crate::AiError;

/// Sampling temperature sent to every provider.
pub const TEMPERATURE: f32 = 0.7;

/// Number of candidates requested.
pub const CANDIDATE_COUNT: u32 = 1;

/// Upper bound on generated tokens.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Trait for text-generation providers.
#[async_trait::async_trait]
pub trait InsightProvider: Send + Sync {
    /// Short provider name for logs and responses (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generates a completion for a single-turn prompt.
    ///
    /// # Errors
    ///
    /// * [`AiError::Http`] if the request fails
    /// * [`AiError::Provider`] if the provider answers with an error status
    /// * [`AiError::SchemaMismatch`] if the reply is not in the expected
    ///   shape
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Creates an insight provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `GEMINI_API_KEY` set -> Google Gemini
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
///
/// `AI_MODEL` overrides the provider's default model.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn InsightProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());
    let model = std::env::var("AI_MODEL").ok().filter(|m| !m.trim().is_empty());

    match provider.to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = require_env("GEMINI_API_KEY")?;
            let model = model.unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
            Ok(Box::new(gemini::GeminiProvider::new(api_key, model)))
        }
        "anthropic" | "claude" => {
            let api_key = require_env("ANTHROPIC_API_KEY")?;
            let model = model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        "" => Err(AiError::Config {
            message: "No AI credentials found. Set GEMINI_API_KEY or ANTHROPIC_API_KEY."
                .to_string(),
        }),
        other => Err(AiError::Config {
            message: format!("Unknown AI provider: {other}. Use 'gemini' or 'anthropic'."),
        }),
    }
}

fn require_env(name: &str) -> Result<String, AiError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AiError::Config {
            message: format!("{name} environment variable not set"),
        })
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns an empty string when nothing is configured.
fn detect_provider() -> String {
    if std::env::var("GEMINI_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Gemini (GEMINI_API_KEY found)");
        return "gemini".to_string();
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    log::warn!("No AI credentials detected. Set one of: GEMINI_API_KEY, ANTHROPIC_API_KEY");
    String::new()
}
