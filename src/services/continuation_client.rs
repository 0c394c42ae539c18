//! HTTP client for the word prediction service.
//!
//! One request per keystroke: a POST with `{ "locale": .., "prompt": .. }`
//! to the configured endpoint, answered by `{ "continuations": [..] }`.
//! Each fetch runs on its own background thread and delivers its outcome
//! through the [`SuggestBridge`](crate::services::suggest_bridge); in-flight
//! requests are never cancelled, staleness is handled at delivery time by
//! the coordinator's request-id check.

use crate::config::ServiceConfig;
use crate::services::suggest_bridge::SuggestMessage;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// Request body sent to the prediction service.
#[derive(Debug, Serialize)]
struct ContinuationRequest<'a> {
    locale: &'a str,
    prompt: &'a str,
}

/// Response body from the prediction service. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct ContinuationResponse {
    continuations: Vec<String>,
}

/// Fetch error types
#[derive(Debug)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, or a failed body read.
    Transport(String),
    /// The response body was not the expected JSON shape.
    MalformedBody(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Transport error: {msg}"),
            FetchError::MalformedBody(msg) => write!(f, "Malformed response body: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Client for the continuation endpoint.
#[derive(Debug, Clone)]
pub struct ContinuationClient {
    endpoint: String,
    locale: String,
    timeout: Duration,
}

impl ContinuationClient {
    pub fn new(endpoint: String, locale: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            locale,
            timeout,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.locale.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch continuations for a prompt (blocking).
    pub fn fetch_continuations(&self, prompt: &str) -> Result<Vec<String>, FetchError> {
        let body = serde_json::to_string(&ContinuationRequest {
            locale: &self.locale,
            prompt,
        })
        .map_err(|e| FetchError::MalformedBody(e.to_string()))?;

        tracing::debug!(
            "Requesting continuations from {} ({} byte prompt)",
            self.endpoint,
            prompt.len()
        );
        let response = ureq::post(&self.endpoint)
            .set("Content-Type", "application/json")
            .timeout(self.timeout)
            .send_string(&body)
            .map_err(|e| {
                tracing::debug!("Continuation request failed: {}", e);
                FetchError::Transport(e.to_string())
            })?;

        let text = response
            .into_string()
            .map_err(|e| FetchError::Transport(format!("Failed to read response body: {e}")))?;

        let parsed: ContinuationResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedBody(e.to_string()))?;

        tracing::debug!("Received {} continuations", parsed.continuations.len());
        Ok(parsed.continuations)
    }

    /// Run one fetch on a background thread, delivering the outcome through
    /// `sender`.
    ///
    /// `current_word` is the in-progress word at dispatch time; it travels
    /// with the response so case matching uses the state the request was
    /// made against. The send result is ignored: if the receiver is gone the
    /// editor is shutting down.
    pub fn spawn_fetch(
        &self,
        request_id: u64,
        prompt: String,
        current_word: String,
        sender: Sender<SuggestMessage>,
    ) {
        let client = self.clone();
        thread::spawn(move || {
            let message = match client.fetch_continuations(&prompt) {
                Ok(items) => SuggestMessage::Continuations {
                    request_id,
                    current_word,
                    items,
                },
                Err(e) => SuggestMessage::FetchFailed {
                    request_id,
                    error: e.to_string(),
                },
            };
            let _ = sender.send(message);
        });
    }
}
