//! HTTP retry helper for transient errors.
//!
//! Overpass instances are shared and frequently answer 429 or 504 under
//! load. [`send_json`] retries those with exponential backoff and gives up
//! immediately on other client errors.
//!
//! ```ignore
//! let body = retry::send_json(|| client.post(&url).form(&[("data", &query)])).await?;
//! ```

use std::time::Duration;

use crate::SourceError;

/// Maximum number of retry attempts (1s, 2s, 4s backoff).
const MAX_RETRIES: u32 = 3;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt because a
/// [`reqwest::RequestBuilder`] is consumed by `.send()`.
///
/// # Errors
///
/// * [`SourceError::Http`] if the request fails after all retries
/// * [`SourceError::Status`] on a non-retryable status, or a retryable one
///   that persists
/// * [`SourceError::Parse`] if the body is not valid JSON
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request).await?;
    let url = response.url().to_string();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::error!("JSON parse failed\n  url: {url}\n  error: {e}\n  body preview: {preview}");
        SourceError::Parse {
            message: format!("invalid JSON: {e}"),
        }
    })
}

#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = Duration::from_secs(1u64 << (attempt - 1));
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) if is_transient(&e) && attempt < MAX_RETRIES => {
                log::warn!("  transient error: {e}");
            }
            Err(e) => return Err(SourceError::Http(e)),
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                if is_retryable(status) && attempt < MAX_RETRIES {
                    log::warn!("  HTTP {status}");
                } else {
                    return Err(SourceError::Status {
                        status: status.as_u16(),
                    });
                }
            }
        }

        attempt += 1;
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body()
}
