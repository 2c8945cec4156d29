use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::is_constraint_violation;
use crate::models::{ModelRecord, NewModel, UpdateModelRequest};
use crate::AppState;

#[derive(Serialize)]
pub struct ModelsListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ModelOperationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelOperationResponse {
    fn ok(model: Option<ModelRecord>) -> Self {
        Self {
            success: true,
            model,
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            model: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/models")
            .route("", web::get().to(list_models))
            .route("", web::post().to(create_model))
            .route("/active", web::get().to(list_active_models))
            .route("/{id}", web::put().to(update_model))
            .route("/{id}", web::delete().to(delete_model))
            .route("/{id}/active", web::put().to(set_model_active)),
    );
}

fn list_response(result: rusqlite::Result<Vec<ModelRecord>>) -> HttpResponse {
    match result {
        Ok(models) => HttpResponse::Ok().json(ModelsListResponse {
            success: true,
            models: Some(models),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to list models: {}", e);
            HttpResponse::InternalServerError().json(ModelsListResponse {
                success: false,
                models: None,
                error: Some("Failed to retrieve models".to_string()),
            })
        }
    }
}

async fn list_models(state: web::Data<AppState>) -> impl Responder {
    list_response(state.db.list_models())
}

async fn list_active_models(state: web::Data<AppState>) -> impl Responder {
    list_response(state.db.list_active_models())
}

async fn create_model(
    state: web::Data<AppState>,
    body: web::Json<NewModel>,
) -> impl Responder {
    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(ModelOperationResponse::err("Model name cannot be empty"));
    }

    match state.db.create_model(&body) {
        Ok(model) => {
            log::info!("Registered model '{}' ({})", model.name, model.provider);
            HttpResponse::Created().json(ModelOperationResponse::ok(Some(model)))
        }
        Err(e) if is_constraint_violation(&e) => HttpResponse::Conflict().json(
            ModelOperationResponse::err(format!("A model named '{}' already exists", body.name.trim())),
        ),
        Err(e) => {
            log::error!("Failed to create model: {}", e);
            HttpResponse::InternalServerError().json(ModelOperationResponse::err("Failed to create model"))
        }
    }
}

async fn update_model(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateModelRequest>,
) -> impl Responder {
    let id = path.into_inner();

    if matches!(body.name.as_deref(), Some(name) if name.trim().is_empty()) {
        return HttpResponse::BadRequest().json(ModelOperationResponse::err("Model name cannot be empty"));
    }

    match state.db.update_model(id, &body) {
        Ok(Some(model)) => HttpResponse::Ok().json(ModelOperationResponse::ok(Some(model))),
        Ok(None) => HttpResponse::NotFound().json(ModelOperationResponse::err("Model not found")),
        Err(e) if is_constraint_violation(&e) => HttpResponse::Conflict()
            .json(ModelOperationResponse::err("Another model already uses that name")),
        Err(e) => {
            log::error!("Failed to update model {}: {}", id, e);
            HttpResponse::InternalServerError().json(ModelOperationResponse::err("Failed to update model"))
        }
    }
}

async fn set_model_active(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<SetActiveRequest>,
) -> impl Responder {
    let id = path.into_inner();

    match state.db.set_model_active(id, body.is_active) {
        Ok(true) => HttpResponse::Ok().json(ModelOperationResponse::ok(None)),
        Ok(false) => HttpResponse::NotFound().json(ModelOperationResponse::err("Model not found")),
        Err(e) => {
            log::error!("Failed to toggle model {}: {}", id, e);
            HttpResponse::InternalServerError().json(ModelOperationResponse::err("Failed to update model"))
        }
    }
}

async fn delete_model(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();

    match state.db.delete_model(id) {
        Ok(true) => HttpResponse::Ok().json(ModelOperationResponse::ok(None)),
        Ok(false) => HttpResponse::NotFound().json(ModelOperationResponse::err("Model not found")),
        Err(e) if is_constraint_violation(&e) => HttpResponse::Conflict().json(
            ModelOperationResponse::err("Model has saved results; deactivate it instead"),
        ),
        Err(e) => {
            log::error!("Failed to delete model {}: {}", id, e);
            HttpResponse::InternalServerError().json(ModelOperationResponse::err("Failed to delete model"))
        }
    }
}
