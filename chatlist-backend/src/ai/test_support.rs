//! Shared fixtures for provider and dispatcher tests

use actix_web::{web, App, HttpServer};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use super::credentials::{Clock, CredentialResolver, SecretSource};
use super::{HttpClients, ProviderContext};
use crate::config::ProviderEndpoints;
use crate::models::ModelRecord;

/// Fixed set of secrets; anything not listed is absent
pub(crate) struct MapSecretSource(HashMap<String, String>);

impl MapSecretSource {
    pub(crate) fn new(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl SecretSource for MapSecretSource {
    fn lookup(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Clock that only moves when told to
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub(crate) fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Start a throwaway HTTP server on a random local port; returns its base URL.
/// Must be called from inside an actix runtime (`#[actix_web::test]`).
pub(crate) fn spawn_stub<F>(configure: F) -> String
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(move || App::new().configure(configure.clone()))
        .workers(1)
        .disable_signals()
        .listen(listener)
        .unwrap()
        .run();
    actix_web::rt::spawn(server);

    format!("http://{}", addr)
}

/// Base URL nothing is listening on
pub(crate) fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Provider context with in-memory secrets and stub endpoints under `base`
pub(crate) fn test_context(secrets: &[(&str, &str)], base: &str) -> ProviderContext {
    test_context_with_timeout(secrets, base, Duration::from_secs(5))
}

pub(crate) fn test_context_with_timeout(
    secrets: &[(&str, &str)],
    base: &str,
    timeout: Duration,
) -> ProviderContext {
    let clients = HttpClients::with_timeout(timeout).unwrap();
    let endpoints = ProviderEndpoints::with_base(base);
    let credentials = CredentialResolver::new(
        Arc::new(MapSecretSource::new(secrets)),
        Arc::new(ManualClock::new(Utc::now())),
        clients.clone(),
        endpoints.clone(),
    );
    ProviderContext {
        clients,
        endpoints,
        credentials,
    }
}

pub(crate) fn model(name: &str, provider: &str, api_url: &str, credential_ref: &str) -> ModelRecord {
    ModelRecord {
        id: 0,
        name: name.to_string(),
        api_url: api_url.to_string(),
        credential_ref: credential_ref.to_string(),
        is_active: true,
        provider: provider.to_string(),
        model_name: String::new(),
    }
}
