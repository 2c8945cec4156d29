pub mod credentials;
pub mod dispatcher;
pub mod gigachat;
pub mod openai;
pub mod yandex;

#[cfg(test)]
pub(crate) mod test_support;

pub use credentials::CredentialResolver;
pub use dispatcher::{Dispatcher, Prompt};

use crate::config::{ProviderEndpoints, ERROR_DETAIL_MAX_CHARS, REQUEST_TIMEOUT_SECS};
use crate::models::{ModelRecord, Outcome, ProviderKind};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// HTTP clients shared by adapters and the credential resolver
#[derive(Clone)]
pub struct HttpClients {
    /// Standard client with certificate verification
    pub default: Client,
    /// GigaChat is served under a national root CA missing from common trust stores
    pub gigachat: Client,
}

impl HttpClients {
    pub fn new() -> Result<Self, String> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub(crate) fn with_timeout(timeout: Duration) -> Result<Self, String> {
        let default = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        let gigachat = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| format!("Failed to create GigaChat HTTP client: {}", e))?;

        Ok(Self { default, gigachat })
    }
}

/// Everything an adapter needs to talk to its provider
pub struct ProviderContext {
    pub clients: HttpClients,
    pub endpoints: ProviderEndpoints,
    pub credentials: CredentialResolver,
}

impl ProviderContext {
    /// Context reading credentials from the process environment
    pub fn from_env(endpoints: ProviderEndpoints) -> Result<Self, String> {
        let clients = HttpClients::new()?;
        let credentials = CredentialResolver::from_env(clients.clone(), endpoints.clone());
        Ok(Self {
            clients,
            endpoints,
            credentials,
        })
    }
}

/// Request/response scheme used to reach a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAdapter {
    OpenAiCompatible,
    GigaChat,
    Yandex,
}

impl ProviderAdapter {
    pub fn for_kind(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::OpenAiCompatible | ProviderKind::Generic => {
                ProviderAdapter::OpenAiCompatible
            }
            ProviderKind::GigaChat => ProviderAdapter::GigaChat,
            ProviderKind::Yandex => ProviderAdapter::Yandex,
        }
    }

    pub fn for_model(model: &ModelRecord) -> Self {
        Self::for_kind(model.provider_kind())
    }

    /// Send one prompt and normalize whatever happens into an Outcome
    pub async fn send(&self, ctx: &ProviderContext, model: &ModelRecord, prompt: &str) -> Outcome {
        match self {
            ProviderAdapter::OpenAiCompatible => openai::send(ctx, model, prompt).await,
            ProviderAdapter::GigaChat => gigachat::send(ctx, model, prompt).await,
            ProviderAdapter::Yandex => yandex::send(ctx, model, prompt).await,
        }
    }
}

/// Classify a failed HTTP call that never produced a status
pub(crate) fn transport_outcome(err: &reqwest::Error) -> Outcome {
    if err.is_timeout() {
        Outcome::Timeout
    } else if err.is_connect() {
        Outcome::Unreachable
    } else {
        Outcome::UnknownError(format!("HTTP request failed: {}", err))
    }
}

/// Human-readable description of a transport failure (for nested detail strings)
pub(crate) fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out after {} seconds", REQUEST_TIMEOUT_SECS)
    } else if err.is_connect() {
        "could not connect".to_string()
    } else {
        err.to_string()
    }
}

/// Upstream error message: JSON `error.message` when present, else the truncated body
pub(crate) fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("empty response body")
            .to_string();
    }
    truncate_detail(trimmed)
}

/// Cut text to ERROR_DETAIL_MAX_CHARS characters on a char boundary
pub(crate) fn truncate_detail(text: &str) -> String {
    match text.char_indices().nth(ERROR_DETAIL_MAX_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Wrap answer text, keeping zero-length answers distinguishable from success
pub(crate) fn text_outcome(text: Option<&str>) -> Outcome {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Outcome::Success(t.to_string()),
        _ => Outcome::EmptyResponse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_selection() {
        assert_eq!(
            ProviderAdapter::for_kind(ProviderKind::Generic),
            ProviderAdapter::OpenAiCompatible
        );
        assert_eq!(
            ProviderAdapter::for_kind(ProviderKind::from_tag("gigachat")),
            ProviderAdapter::GigaChat
        );
        assert_eq!(
            ProviderAdapter::for_kind(ProviderKind::from_tag("yandex")),
            ProviderAdapter::Yandex
        );
    }

    #[test]
    fn test_error_detail_prefers_json_message() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#;
        assert_eq!(error_detail(StatusCode::UNAUTHORIZED, body), "Invalid API key");
    }

    #[test]
    fn test_error_detail_falls_back_to_raw_text() {
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "<html>bad gateway</html>"
        );
        // JSON without error.message is still raw text
        assert_eq!(
            error_detail(StatusCode::BAD_REQUEST, r#"{"detail":"nope"}"#),
            r#"{"detail":"nope"}"#
        );
        assert_eq!(error_detail(StatusCode::SERVICE_UNAVAILABLE, "  "), "Service Unavailable");
    }

    #[test]
    fn test_truncate_detail_on_char_boundary() {
        let long = "ж".repeat(ERROR_DETAIL_MAX_CHARS + 50);
        let cut = truncate_detail(&long);
        assert_eq!(cut.chars().count(), ERROR_DETAIL_MAX_CHARS + 1);
        assert!(cut.ends_with('…'));

        assert_eq!(truncate_detail("short"), "short");
    }

    #[test]
    fn test_text_outcome() {
        assert_eq!(text_outcome(Some("  pong\n")), Outcome::Success("pong".into()));
        assert_eq!(text_outcome(Some(" \n\t")), Outcome::EmptyResponse);
        assert_eq!(text_outcome(None), Outcome::EmptyResponse);
    }
}
