use super::credentials::TokenExchange;
use super::{openai, ProviderContext};
use crate::config::GIGACHAT_SCOPE;
use crate::models::{ModelRecord, Outcome};

const DEFAULT_CREDENTIAL_PREFIX: &str = "GIGACHAT";
const DEFAULT_MODEL: &str = "GigaChat";

/// `<REF>_CLIENT_ID` / `<REF>_CLIENT_SECRET` for the model's credential reference
fn token_exchange(model: &ModelRecord) -> TokenExchange {
    let prefix = match model.credential_ref.trim() {
        "" => DEFAULT_CREDENTIAL_PREFIX,
        r => r,
    };
    TokenExchange::GigaChatOAuth {
        id_var: format!("{}_CLIENT_ID", prefix),
        secret_var: format!("{}_CLIENT_SECRET", prefix),
        scope: GIGACHAT_SCOPE.to_string(),
    }
}

pub(crate) async fn send(ctx: &ProviderContext, model: &ModelRecord, prompt: &str) -> Outcome {
    let exchange = token_exchange(model);
    let token = match ctx.credentials.resolve_exchanged_token(&exchange).await {
        Ok(t) => t,
        Err(e) => {
            log::warn!("[GIGACHAT] Token for '{}' unavailable: {}", model.name, e);
            return e.into();
        }
    };

    let model_id = match model.model_name.trim() {
        "" => DEFAULT_MODEL,
        m => m,
    };

    let outcome = openai::complete(
        &ctx.clients.gigachat,
        &ctx.endpoints.gigachat_chat_url,
        &token.token,
        model_id,
        prompt,
    )
    .await;

    if let Outcome::ProviderHttpError { status: 401, .. } = outcome {
        ctx.credentials.invalidate(&exchange);
    }
    outcome
}
