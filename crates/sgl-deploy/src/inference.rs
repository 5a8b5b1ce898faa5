use std::time::Duration;

use sgl_deploy_common::{ChatCompletion, ChatCompletionRequest, ChatMessage};

use crate::error::InferenceTransportError;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";
/// sglang serves the loaded model under this name unless `--served-model-name` is set.
pub const SERVED_MODEL: &str = "default";
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const USER_PROMPT: &str = "List 3 countries and their capitals.";

pub fn completions_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}{COMPLETIONS_PATH}")
}

/// The fixed sample conversation.
pub fn build_payload(temperature: f64, max_tokens: u32) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: SERVED_MODEL.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(USER_PROMPT),
        ],
        temperature,
        max_tokens,
    }
}

/// What came back from the completion request, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceResult {
    /// `None` when no response was received.
    pub status: Option<u16>,
    pub body: String,
    pub error: Option<String>,
}

impl InferenceResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

/// Sends the sample chat-completion request.
#[derive(Debug, Clone)]
pub struct RequestRunner {
    http: reqwest::Client,
    api_key: String,
}

impl RequestRunner {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(http, api_key))
    }

    pub fn with_client(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }

    /// One POST, no retry. Any HTTP status is a result; only a missing
    /// response is reported through `error`.
    pub async fn run_inference(&self, port: u16, temperature: f64, max_tokens: u32) -> InferenceResult {
        let url = completions_url(port);
        let payload = build_payload(temperature, max_tokens);

        tracing::info!(%url, temperature, max_tokens, "sending inference request");
        let resp = match self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(source) => return transport_failure(None, url, source),
        };

        let status = resp.status();
        match resp.text().await {
            Ok(body) => {
                log_response(status, &body);
                InferenceResult {
                    status: Some(status.as_u16()),
                    body,
                    error: None,
                }
            }
            Err(source) => transport_failure(Some(status.as_u16()), url, source),
        }
    }
}

fn transport_failure(status: Option<u16>, url: String, source: reqwest::Error) -> InferenceResult {
    let err = InferenceTransportError { url, source };
    tracing::error!(error=%err, "inference error");
    InferenceResult {
        status,
        body: String::new(),
        error: Some(err.to_string()),
    }
}

fn log_response(status: reqwest::StatusCode, body: &str) {
    if status.is_success() {
        tracing::info!(status = status.as_u16(), "inference response");
    } else {
        tracing::warn!(status = status.as_u16(), "inference response with non-success status");
    }
    tracing::info!("{body}");

    let Ok(completion) = serde_json::from_str::<ChatCompletion>(body) else {
        return;
    };
    if let Some(content) = completion.first_content() {
        tracing::info!(
            finish_reason = completion.finish_reason().unwrap_or(""),
            completion_tokens = completion.usage.map(|u| u.completion_tokens),
            "assistant: {content}"
        );
    }
}
