#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Natural-language market insight for clustered stores.
//!
//! [`prompt::build_prompt`] turns cluster briefs and optional population
//! context into a retail-analyst prompt, an [`providers::InsightProvider`]
//! (Gemini or Anthropic Claude) generates the reply, and
//! [`sections::split_sections`] breaks the reply into headed sections for
//! display.

pub mod prompt;
pub mod providers;
pub mod sections;

pub use prompt::{SECTION_HEADINGS, build_prompt};
pub use providers::{InsightProvider, create_provider_from_env};
pub use sections::{InsightSection, split_sections};

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The provider answered, but not in the documented response shape.
    #[error("Unexpected response shape: {message}")]
    SchemaMismatch {
        /// Which part of the shape was missing.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}
