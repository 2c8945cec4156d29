use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::credentials::TokenExchange;
use super::{error_detail, text_outcome, transport_outcome, ProviderContext};
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::models::{ModelRecord, Outcome};

const DEFAULT_OAUTH_VAR: &str = "YANDEX_OAUTH_TOKEN";
const FOLDER_VAR: &str = "YANDEX_FOLDER_ID";
const DEFAULT_MODEL: &str = "yandexgpt/latest";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<YandexMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    /// The API takes this as a string
    max_tokens: String,
}

#[derive(Debug, Serialize)]
struct YandexMessage<'a> {
    role: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    message: AlternativeMessage,
}

#[derive(Debug, Deserialize)]
struct AlternativeMessage {
    text: Option<String>,
}

fn token_exchange(model: &ModelRecord) -> TokenExchange {
    let oauth_var = match model.credential_ref.trim() {
        "" => DEFAULT_OAUTH_VAR,
        r => r,
    };
    TokenExchange::YandexIam {
        oauth_var: oauth_var.to_string(),
        folder_var: FOLDER_VAR.to_string(),
    }
}

pub(crate) async fn send(ctx: &ProviderContext, model: &ModelRecord, prompt: &str) -> Outcome {
    let exchange = token_exchange(model);
    let token = match ctx.credentials.resolve_exchanged_token(&exchange).await {
        Ok(t) => t,
        Err(e) => {
            log::warn!("[YANDEX] Token for '{}' unavailable: {}", model.name, e);
            return e.into();
        }
    };
    let folder_id = token.scope_context.unwrap_or_default();

    let url = match model.api_url.trim() {
        "" => ctx.endpoints.yandex_completion_url.as_str(),
        u => u,
    };
    let model_id = match model.model_name.trim() {
        "" => DEFAULT_MODEL,
        m => m,
    };

    let request = CompletionRequest {
        model_uri: format!("gpt://{}/{}", folder_id, model_id),
        completion_options: CompletionOptions {
            stream: false,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS.to_string(),
        },
        messages: vec![YandexMessage {
            role: "user",
            text: prompt,
        }],
    };

    log::debug!("[YANDEX] POST {} modelUri={}", url, request.model_uri);

    let response = match ctx
        .clients
        .default
        .post(url)
        .bearer_auth(&token.token)
        .header("x-folder-id", &folder_id)
        .json(&request)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            log::warn!("[YANDEX] Request to {} failed: {}", url, e);
            return transport_outcome(&e);
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => return transport_outcome(&e),
    };

    let outcome = parse_completion_response(status, &body);
    if let Outcome::ProviderHttpError { status: 401, .. } = outcome {
        ctx.credentials.invalidate(&exchange);
    }
    if !outcome.is_success() {
        log::warn!("[YANDEX] {} returned {}: {}", url, status, outcome.display_text());
    }
    outcome
}

fn parse_completion_response(status: StatusCode, body: &str) -> Outcome {
    if status != StatusCode::OK {
        return Outcome::ProviderHttpError {
            status: status.as_u16(),
            detail: error_detail(status, body),
        };
    }

    let parsed: CompletionResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            return Outcome::MalformedResponse(format!("unexpected completion response: {}", e))
        }
    };

    match parsed.result.alternatives.into_iter().next() {
        Some(alternative) => text_outcome(alternative.message.text.as_deref()),
        None => Outcome::MalformedResponse("completion response has no alternatives".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::test_support::{model, spawn_stub, test_context};
    use actix_web::{web, HttpRequest, HttpResponse};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_parse_alternative_text() {
        let body = r#"{"result":{"alternatives":[{"message":{"role":"assistant","text":" hi "}}]}}"#;
        assert_eq!(parse_completion_response(StatusCode::OK, body), Outcome::Success("hi".into()));

        let blank = r#"{"result":{"alternatives":[{"message":{"role":"assistant","text":""}}]}}"#;
        assert_eq!(parse_completion_response(StatusCode::OK, blank), Outcome::EmptyResponse);
    }

    #[test]
    fn test_parse_missing_path_is_malformed() {
        for body in [
            r#"{"result":{}}"#,
            r#"{"result":{"alternatives":[]}}"#,
            r#"{"choices":[]}"#,
            "not json",
        ] {
            assert!(
                matches!(parse_completion_response(StatusCode::OK, body), Outcome::MalformedResponse(_)),
                "{}",
                body
            );
        }
    }

    #[test]
    fn test_oauth_var_defaults() {
        let record = model("Yandex GPT", "yandex", "", "");
        assert_eq!(
            token_exchange(&record),
            TokenExchange::YandexIam {
                oauth_var: "YANDEX_OAUTH_TOKEN".into(),
                folder_var: "YANDEX_FOLDER_ID".into(),
            }
        );
    }

    #[actix_web::test]
    async fn test_send_end_to_end_reuses_iam_token() {
        let iam_hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(parking_lot::Mutex::new(None::<(String, String, Value)>));
        let (counter, sink) = (iam_hits.clone(), seen.clone());
        let base = spawn_stub(move |cfg: &mut web::ServiceConfig| {
            let counter = counter.clone();
            let sink = sink.clone();
            cfg.route(
                "/yandex/iam",
                web::post().to(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        HttpResponse::Ok()
                            .json(json!({"iamToken": "t", "expiresAt": "2999-01-01T00:00:00Z"}))
                    }
                }),
            )
            .route(
                "/yandex/completion",
                web::post().to(move |req: HttpRequest, body: web::Json<Value>| {
                    let sink = sink.clone();
                    async move {
                        let header = |name: &str| {
                            req.headers()
                                .get(name)
                                .and_then(|h| h.to_str().ok())
                                .unwrap_or_default()
                                .to_string()
                        };
                        *sink.lock() =
                            Some((header("Authorization"), header("x-folder-id"), body.into_inner()));
                        HttpResponse::Ok().json(json!({
                            "result": {"alternatives": [{"message": {"role": "assistant", "text": "hi"}}]}
                        }))
                    }
                }),
            );
        });

        let ctx = test_context(
            &[("YANDEX_OAUTH_TOKEN", "oauth"), ("YANDEX_FOLDER_ID", "b1gfolder")],
            &base,
        );
        let record = model("Yandex GPT", "yandex", "", "YANDEX_OAUTH_TOKEN");

        assert_eq!(send(&ctx, &record, "hello").await, Outcome::Success("hi".into()));
        assert_eq!(send(&ctx, &record, "hello").await, Outcome::Success("hi".into()));
        assert_eq!(iam_hits.load(Ordering::SeqCst), 1);

        let (auth, folder, body) = seen.lock().clone().unwrap();
        assert_eq!(auth, "Bearer t");
        assert_eq!(folder, "b1gfolder");
        assert_eq!(body["modelUri"], "gpt://b1gfolder/yandexgpt/latest");
        assert_eq!(body["completionOptions"]["stream"], false);
        assert_eq!(body["completionOptions"]["maxTokens"], "1024");
        assert_eq!(body["messages"][0]["text"], "hello");
    }

    #[actix_web::test]
    async fn test_send_missing_folder() {
        let ctx = test_context(&[("YANDEX_OAUTH_TOKEN", "oauth")], "http://127.0.0.1:9");
        let record = model("Yandex GPT", "yandex", "", "");

        let outcome = send(&ctx, &record, "hello").await;
        assert!(matches!(outcome, Outcome::MissingCredential(m) if m.contains("YANDEX_FOLDER_ID")));
    }
}
