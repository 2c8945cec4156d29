use serde::{Deserialize, Serialize};

use crate::config::REQUEST_TIMEOUT_SECS;

/// Normalized result of sending one prompt to one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Success(String),
    /// The provider answered 200 but produced no text
    EmptyResponse,
    MissingCredential(String),
    CredentialExchangeFailed(String),
    ProviderHttpError { status: u16, detail: String },
    Timeout,
    Unreachable,
    /// The provider answered 200 with a body we could not read
    MalformedResponse(String),
    UnknownError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Short machine-friendly label
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::EmptyResponse => "empty_response",
            Outcome::MissingCredential(_) => "missing_credential",
            Outcome::CredentialExchangeFailed(_) => "credential_exchange_failed",
            Outcome::ProviderHttpError { .. } => "provider_http_error",
            Outcome::Timeout => "timeout",
            Outcome::Unreachable => "unreachable",
            Outcome::MalformedResponse(_) => "malformed_response",
            Outcome::UnknownError(_) => "unknown_error",
        }
    }

    /// Text shown to the user: the answer itself, or a bracketed error
    pub fn display_text(&self) -> String {
        match self {
            Outcome::Success(text) => text.clone(),
            Outcome::EmptyResponse => "[Empty response] the model returned no text".to_string(),
            Outcome::MissingCredential(detail) => format!("[Missing credential] {}", detail),
            Outcome::CredentialExchangeFailed(detail) => {
                format!("[Authorization failed] {}", detail)
            }
            Outcome::ProviderHttpError { status, detail } => {
                format!("[HTTP {}] {}", status, detail)
            }
            Outcome::Timeout => format!(
                "[Timeout] no response within {} seconds",
                REQUEST_TIMEOUT_SECS
            ),
            Outcome::Unreachable => "[Unreachable] could not connect to the provider".to_string(),
            Outcome::MalformedResponse(detail) => format!("[Malformed response] {}", detail),
            Outcome::UnknownError(detail) => format!("[Error] {}", detail),
        }
    }
}
