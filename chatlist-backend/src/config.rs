use std::env;

/// Sampling temperature sent with every completion request
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Completion length cap sent with every completion request
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Per-call HTTP timeout, applied to token exchanges and completions alike
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Upstream error bodies longer than this are truncated before display
pub const ERROR_DETAIL_MAX_CHARS: usize = 200;

pub const GIGACHAT_OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const GIGACHAT_CHAT_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const GIGACHAT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const YANDEX_IAM_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
pub const YANDEX_COMPLETION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub endpoints: ProviderEndpoints,
}

impl Config {
    pub fn from_env() -> Self {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("PORT={} is not a valid port number, using 8080", raw);
                8080
            }),
            Err(_) => 8080,
        };

        Self {
            port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "./.db/chatlist.db".to_string()),
            endpoints: ProviderEndpoints::from_env(),
        }
    }
}

/// Fixed upstream URLs for providers whose endpoint is not stored per model.
///
/// Each can be overridden from the environment, which is how a staging
/// gateway or a local stub is wired in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub gigachat_oauth_url: String,
    pub gigachat_chat_url: String,
    pub yandex_iam_url: String,
    pub yandex_completion_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            gigachat_oauth_url: GIGACHAT_OAUTH_URL.to_string(),
            gigachat_chat_url: GIGACHAT_CHAT_URL.to_string(),
            yandex_iam_url: YANDEX_IAM_URL.to_string(),
            yandex_completion_url: YANDEX_COMPLETION_URL.to_string(),
        }
    }
}

impl ProviderEndpoints {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gigachat_oauth_url: env::var("GIGACHAT_OAUTH_URL")
                .unwrap_or(defaults.gigachat_oauth_url),
            gigachat_chat_url: env::var("GIGACHAT_CHAT_URL").unwrap_or(defaults.gigachat_chat_url),
            yandex_iam_url: env::var("YANDEX_IAM_URL").unwrap_or(defaults.yandex_iam_url),
            yandex_completion_url: env::var("YANDEX_COMPLETION_URL")
                .unwrap_or(defaults.yandex_completion_url),
        }
    }

    /// Point every fixed endpoint at one base URL (local stubs in tests)
    #[cfg(test)]
    pub fn with_base(base: &str) -> Self {
        Self {
            gigachat_oauth_url: format!("{}/gigachat/oauth", base),
            gigachat_chat_url: format!("{}/gigachat/chat", base),
            yandex_iam_url: format!("{}/yandex/iam", base),
            yandex_completion_url: format!("{}/yandex/completion", base),
        }
    }
}
