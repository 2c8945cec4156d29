//! Credential resolution for providers
//!
//! Adapters never read the environment or talk to identity endpoints
//! themselves. They ask the resolver for either a plain key, a client
//! id/secret pair, or a short-lived token obtained by exchanging a
//! long-lived credential. Exchanged tokens are cached per credential and
//! reused until they expire.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::{describe_transport_error, error_detail, HttpClients};
use crate::config::ProviderEndpoints;
use crate::models::Outcome;

/// Name to secret lookup. `None` means absent, which is reported differently from empty.
pub trait SecretSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Secrets from the process environment (populated from `.env` at startup)
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
    fn lookup(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("{0}")]
    Missing(String),
    #[error("{0}")]
    ExchangeFailed(String),
}

impl From<CredentialError> for Outcome {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Missing(detail) => Outcome::MissingCredential(detail),
            CredentialError::ExchangeFailed(detail) => Outcome::CredentialExchangeFailed(detail),
        }
    }
}

/// A long-lived credential that is traded for a short-lived bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenExchange {
    /// Yandex Passport OAuth token → IAM token; folder id travels with it
    YandexIam { oauth_var: String, folder_var: String },
    /// GigaChat client id/secret → access token for `scope`
    GigaChatOAuth {
        id_var: String,
        secret_var: String,
        scope: String,
    },
}

impl TokenExchange {
    /// Cache slot; distinct credentials never share a token
    pub fn cache_key(&self) -> String {
        match self {
            TokenExchange::YandexIam { oauth_var, .. } => format!("yandex:{}", oauth_var),
            TokenExchange::GigaChatOAuth { id_var, scope, .. } => {
                format!("gigachat:{}:{}", id_var, scope)
            }
        }
    }
}

/// Token ready for use, plus provider scope (Yandex folder id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangedToken {
    pub token: String,
    pub scope_context: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    #[serde(rename = "iamToken")]
    iam_token: Option<String>,
    #[serde(rename = "expiresAt")]
    expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: Option<String>,
    /// Unix epoch, milliseconds
    expires_at: Option<i64>,
}

pub struct CredentialResolver {
    secrets: Arc<dyn SecretSource>,
    clock: Arc<dyn Clock>,
    clients: HttpClients,
    endpoints: ProviderEndpoints,
    cache: DashMap<String, CachedToken>,
}

impl CredentialResolver {
    pub fn new(
        secrets: Arc<dyn SecretSource>,
        clock: Arc<dyn Clock>,
        clients: HttpClients,
        endpoints: ProviderEndpoints,
    ) -> Self {
        Self {
            secrets,
            clock,
            clients,
            endpoints,
            cache: DashMap::new(),
        }
    }

    pub fn from_env(clients: HttpClients, endpoints: ProviderEndpoints) -> Self {
        Self::new(Arc::new(EnvSecretSource), Arc::new(SystemClock), clients, endpoints)
    }

    /// Look up a single named secret
    pub fn resolve_simple_key(&self, var: &str) -> Result<String, CredentialError> {
        match self.secrets.lookup(var) {
            None => Err(CredentialError::Missing(format!(
                "{} is not set. Add it to the .env file",
                var
            ))),
            Some(value) if value.trim().is_empty() => Err(CredentialError::Missing(format!(
                "{} is set but empty",
                var
            ))),
            Some(value) => Ok(value.trim().to_string()),
        }
    }

    /// Look up a client id/secret pair
    pub fn resolve_client_credentials(
        &self,
        id_var: &str,
        secret_var: &str,
    ) -> Result<(String, String), CredentialError> {
        let client_id = self.resolve_simple_key(id_var)?;
        let client_secret = self.resolve_simple_key(secret_var)?;
        Ok((client_id, client_secret))
    }

    /// Return a valid short-lived token, exchanging only when the cached one is absent or expired
    pub async fn resolve_exchanged_token(
        &self,
        exchange: &TokenExchange,
    ) -> Result<ExchangedToken, CredentialError> {
        let scope_context = match exchange {
            TokenExchange::YandexIam { folder_var, .. } => {
                Some(self.resolve_simple_key(folder_var)?)
            }
            TokenExchange::GigaChatOAuth { .. } => None,
        };

        let key = exchange.cache_key();
        let now = self.clock.now();
        let cached = self
            .cache
            .get(&key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.token.clone());

        if let Some(token) = cached {
            log::debug!("[CREDENTIALS] Reusing cached token for {}", key);
            return Ok(ExchangedToken {
                token,
                scope_context,
            });
        }

        log::info!("[CREDENTIALS] Exchanging credential for {}", key);
        let (token, expires_at) = match exchange {
            TokenExchange::YandexIam { oauth_var, .. } => self.exchange_yandex(oauth_var).await?,
            TokenExchange::GigaChatOAuth {
                id_var,
                secret_var,
                scope,
            } => self.exchange_gigachat(id_var, secret_var, scope).await?,
        };

        match expires_at {
            Some(expires_at) => {
                self.cache.insert(
                    key,
                    CachedToken {
                        token: token.clone(),
                        expires_at,
                    },
                );
            }
            None => log::warn!("[CREDENTIALS] Token for {} has no expiry, not caching", key),
        }

        Ok(ExchangedToken {
            token,
            scope_context,
        })
    }

    /// Forget a cached token (the upstream rejected it)
    pub fn invalidate(&self, exchange: &TokenExchange) {
        if self.cache.remove(&exchange.cache_key()).is_some() {
            log::info!("[CREDENTIALS] Dropped cached token for {}", exchange.cache_key());
        }
    }

    async fn exchange_yandex(
        &self,
        oauth_var: &str,
    ) -> Result<(String, Option<DateTime<Utc>>), CredentialError> {
        let oauth_token = self.resolve_simple_key(oauth_var)?;

        let response = self
            .clients
            .default
            .post(&self.endpoints.yandex_iam_url)
            .json(&json!({ "yandexPassportOauthToken": oauth_token }))
            .send()
            .await
            .map_err(|e| {
                CredentialError::ExchangeFailed(format!(
                    "IAM token request failed: {}",
                    describe_transport_error(&e)
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CredentialError::ExchangeFailed(format!(
                "Failed to read IAM token response: {}",
                describe_transport_error(&e)
            ))
        })?;

        if !status.is_success() {
            return Err(CredentialError::ExchangeFailed(format!(
                "IAM token endpoint returned {}: {}",
                status.as_u16(),
                error_detail(status, &body)
            )));
        }

        let parsed: IamTokenResponse = serde_json::from_str(&body).map_err(|e| {
            CredentialError::ExchangeFailed(format!("Malformed IAM token response: {}", e))
        })?;

        let token = parsed
            .iam_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CredentialError::ExchangeFailed("IAM token response has no iamToken".to_string())
            })?;

        let expires_at = match parsed.expires_at {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        CredentialError::ExchangeFailed(format!(
                            "IAM token response has invalid expiresAt '{}': {}",
                            raw, e
                        ))
                    })?,
            ),
            None => None,
        };

        Ok((token, expires_at))
    }

    async fn exchange_gigachat(
        &self,
        id_var: &str,
        secret_var: &str,
        scope: &str,
    ) -> Result<(String, Option<DateTime<Utc>>), CredentialError> {
        let (client_id, client_secret) = self.resolve_client_credentials(id_var, secret_var)?;
        let basic = BASE64.encode(format!("{}:{}", client_id, client_secret));

        let response = self
            .clients
            .gigachat
            .post(&self.endpoints.gigachat_oauth_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", basic))
            .header("RqUID", Uuid::new_v4().to_string())
            .form(&[("scope", scope)])
            .send()
            .await
            .map_err(|e| {
                CredentialError::ExchangeFailed(format!(
                    "GigaChat token request failed: {}",
                    describe_transport_error(&e)
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CredentialError::ExchangeFailed(format!(
                "Failed to read GigaChat token response: {}",
                describe_transport_error(&e)
            ))
        })?;

        if !status.is_success() {
            return Err(CredentialError::ExchangeFailed(format!(
                "GigaChat token endpoint returned {}: {}",
                status.as_u16(),
                error_detail(status, &body)
            )));
        }

        let parsed: OAuthTokenResponse = serde_json::from_str(&body).map_err(|e| {
            CredentialError::ExchangeFailed(format!("Malformed GigaChat token response: {}", e))
        })?;

        let token = parsed
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CredentialError::ExchangeFailed("No access_token in GigaChat response".to_string())
            })?;

        Ok((token, parsed.expires_at.and_then(DateTime::from_timestamp_millis)))
    }
}
