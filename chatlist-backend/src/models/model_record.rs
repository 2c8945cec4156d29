use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// Adapter family selected by a model's `provider` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum ProviderKind {
    /// Bearer-key chat completions (`choices[0].message.content`)
    #[serde(rename = "openai-compatible")]
    #[strum(
        to_string = "openai-compatible",
        serialize = "openai",
        serialize = "deepseek",
        serialize = "openrouter",
        serialize = "groq",
        serialize = "anthropic"
    )]
    OpenAiCompatible,
    /// Sber GigaChat: OAuth client credentials, then bearer chat completions
    #[serde(rename = "gigachat")]
    #[strum(to_string = "gigachat")]
    GigaChat,
    /// Yandex Foundation Models: IAM token exchange, `modelUri` request schema
    #[serde(rename = "yandex")]
    #[strum(to_string = "yandex")]
    Yandex,
    /// Unrecognized tag, served as OpenAI-compatible on a best-effort basis
    #[serde(rename = "generic")]
    #[strum(to_string = "generic")]
    Generic,
}

impl ProviderKind {
    /// Map a stored tag to a provider, never failing
    pub fn from_tag(tag: &str) -> Self {
        ProviderKind::from_str(tag.trim()).unwrap_or(ProviderKind::Generic)
    }
}

/// A configured model from the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: i64,
    pub name: String,
    /// Completion endpoint; ignored by providers with a fixed endpoint
    pub api_url: String,
    /// Environment variable (or variable prefix) holding the credential
    pub credential_ref: String,
    pub is_active: bool,
    pub provider: String,
    /// Upstream model identifier placed in the request body
    pub model_name: String,
}

impl ModelRecord {
    pub fn provider_kind(&self) -> ProviderKind {
        ProviderKind::from_tag(&self.provider)
    }
}

/// Request type for registering a model
#[derive(Debug, Clone, Deserialize)]
pub struct NewModel {
    pub name: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub credential_ref: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model_name: String,
}

fn default_active() -> bool {
    true
}

fn default_provider() -> String {
    "custom".to_string()
}

/// Request type for editing a model; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateModelRequest {
    pub name: Option<String>,
    pub api_url: Option<String>,
    pub credential_ref: Option<String>,
    pub is_active: Option<bool>,
    pub provider: Option<String>,
    pub model_name: Option<String>,
}
