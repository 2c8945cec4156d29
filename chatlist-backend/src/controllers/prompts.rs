use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::is_constraint_violation;
use crate::ai::Prompt;
use crate::models::{Outcome, PromptRecord, SavedResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendPromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectedResponse {
    pub model_id: i64,
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveResultsRequest {
    pub results: Vec<SelectedResponse>,
}

/// One model's answer to a sent prompt
#[derive(Debug, Serialize)]
pub struct ModelResult {
    pub model_id: i64,
    pub model_name: String,
    pub provider: String,
    pub outcome: Outcome,
    pub display_text: String,
    pub elapsed_ms: u64,
}

#[derive(Serialize)]
pub struct SendPromptResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ModelResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendPromptResponse {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            prompt_id: None,
            results: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
pub struct PromptsListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<PromptRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct SavedResultsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SavedResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SavedResultsResponse {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: None,
            saved: None,
            error: Some(message.into()),
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/prompts")
            .route("", web::get().to(list_prompts))
            .route("/send", web::post().to(send_prompt))
            .route("/{id}", web::delete().to(delete_prompt))
            .route("/{id}/results", web::get().to(get_results))
            .route("/{id}/results", web::post().to(save_results)),
    );
}

async fn send_prompt(
    state: web::Data<AppState>,
    body: web::Json<SendPromptRequest>,
) -> impl Responder {
    let prompt = match Prompt::new(&body.prompt) {
        Ok(p) => p,
        Err(e) => return HttpResponse::BadRequest().json(SendPromptResponse::err(e.to_string())),
    };

    let models = match state.db.list_active_models() {
        Ok(models) => models,
        Err(e) => {
            log::error!("Failed to load active models: {}", e);
            return HttpResponse::InternalServerError()
                .json(SendPromptResponse::err("Failed to load models"));
        }
    };
    if models.is_empty() {
        return HttpResponse::BadRequest()
            .json(SendPromptResponse::err("No active models. Enable at least one model first"));
    }

    let tags = body.tags.as_deref().map(str::trim).unwrap_or_default();
    let record = match state.db.save_prompt(prompt.as_str(), tags) {
        Ok(record) => record,
        Err(e) => {
            log::error!("Failed to save prompt: {}", e);
            return HttpResponse::InternalServerError()
                .json(SendPromptResponse::err("Failed to save prompt"));
        }
    };

    let entries = match state.dispatcher.dispatch(&prompt, &models).await {
        Ok(entries) => entries,
        Err(e) => return HttpResponse::BadRequest().json(SendPromptResponse::err(e.to_string())),
    };

    let results = entries
        .into_iter()
        .map(|entry| ModelResult {
            model_id: entry.model.id,
            display_text: entry.outcome.display_text(),
            model_name: entry.model.name,
            provider: entry.model.provider,
            outcome: entry.outcome,
            elapsed_ms: entry.elapsed_ms,
        })
        .collect();

    HttpResponse::Ok().json(SendPromptResponse {
        success: true,
        prompt_id: Some(record.id),
        results: Some(results),
        error: None,
    })
}

async fn list_prompts(
    state: web::Data<AppState>,
    query: web::Query<PromptSearchQuery>,
) -> impl Responder {
    let result = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.db.search_prompts(q),
        _ => state.db.list_prompts(),
    };

    match result {
        Ok(prompts) => HttpResponse::Ok().json(PromptsListResponse {
            success: true,
            prompts: Some(prompts),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to list prompts: {}", e);
            HttpResponse::InternalServerError().json(PromptsListResponse {
                success: false,
                prompts: None,
                error: Some("Failed to retrieve prompts".to_string()),
            })
        }
    }
}

async fn delete_prompt(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();

    match state.db.delete_prompt(id) {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Prompt not found"
        })),
        Err(e) => {
            log::error!("Failed to delete prompt {}: {}", id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Failed to delete prompt"
            }))
        }
    }
}

async fn get_results(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();

    match state.db.get_results_by_prompt(id) {
        Ok(results) => HttpResponse::Ok().json(SavedResultsResponse {
            success: true,
            results: Some(results),
            saved: None,
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to load results for prompt {}: {}", id, e);
            HttpResponse::InternalServerError().json(SavedResultsResponse::err("Failed to retrieve results"))
        }
    }
}

async fn save_results(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<SaveResultsRequest>,
) -> impl Responder {
    let prompt_id = path.into_inner();

    match state.db.get_prompt(prompt_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(SavedResultsResponse::err("Prompt not found"))
        }
        Err(e) => {
            log::error!("Failed to load prompt {}: {}", prompt_id, e);
            return HttpResponse::InternalServerError()
                .json(SavedResultsResponse::err("Failed to save results"));
        }
    }

    let selected: Vec<(i64, &str)> = body
        .results
        .iter()
        .filter(|r| !r.response.trim().is_empty())
        .map(|r| (r.model_id, r.response.as_str()))
        .collect();

    let saved = match state.db.save_results(prompt_id, &selected) {
        Ok(saved) => saved.len(),
        Err(e) if is_constraint_violation(&e) => {
            return HttpResponse::Conflict().json(SavedResultsResponse::err(
                "Selection references an unknown model; nothing was saved",
            ))
        }
        Err(e) => {
            log::error!("Failed to save results for prompt {}: {}", prompt_id, e);
            return HttpResponse::InternalServerError()
                .json(SavedResultsResponse::err("Failed to save results"));
        }
    };

    log::info!("Saved {} result(s) for prompt {}", saved, prompt_id);
    HttpResponse::Ok().json(SavedResultsResponse {
        success: true,
        results: None,
        saved: Some(saved),
        error: None,
    })
}
