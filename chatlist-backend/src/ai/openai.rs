use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{error_detail, text_outcome, transport_outcome, ProviderContext};
use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::models::{ModelRecord, Outcome};

const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI-style chat completion against the model's own URL with a bearer API key
pub(crate) async fn send(ctx: &ProviderContext, model: &ModelRecord, prompt: &str) -> Outcome {
    let api_url = model.api_url.trim();
    if api_url.is_empty() {
        return Outcome::UnknownError(format!(
            "no API URL configured for model '{}'",
            model.name
        ));
    }

    let api_key = match ctx.credentials.resolve_simple_key(&model.credential_ref) {
        Ok(key) => key,
        Err(e) => return e.into(),
    };

    let model_id = if model.model_name.trim().is_empty() {
        DEFAULT_MODEL
    } else {
        model.model_name.trim()
    };

    complete(&ctx.clients.default, api_url, &api_key, model_id, prompt).await
}

/// POST one user message to a chat completions endpoint and classify the reply
pub(crate) async fn complete(
    client: &Client,
    url: &str,
    bearer: &str,
    model_id: &str,
    prompt: &str,
) -> Outcome {
    let request = ChatCompletionRequest {
        model: model_id,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature: DEFAULT_TEMPERATURE,
        max_tokens: DEFAULT_MAX_TOKENS,
    };

    log::debug!("[OPENAI] POST {} model={}", url, model_id);

    let response = match client.post(url).bearer_auth(bearer).json(&request).send().await {
        Ok(r) => r,
        Err(e) => {
            log::warn!("[OPENAI] Request to {} failed: {}", url, e);
            return transport_outcome(&e);
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => return transport_outcome(&e),
    };

    let outcome = parse_chat_response(status, &body);
    if !outcome.is_success() {
        log::warn!("[OPENAI] {} returned {}: {}", url, status, outcome.display_text());
    }
    outcome
}

/// Classify a chat completions reply: only 200 counts as an answer
pub(crate) fn parse_chat_response(status: StatusCode, body: &str) -> Outcome {
    if status != StatusCode::OK {
        return Outcome::ProviderHttpError {
            status: status.as_u16(),
            detail: error_detail(status, body),
        };
    }

    let parsed: ChatCompletionResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            return Outcome::MalformedResponse(format!("invalid chat completion JSON: {}", e))
        }
    };

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);

    text_outcome(content.as_deref())
}
