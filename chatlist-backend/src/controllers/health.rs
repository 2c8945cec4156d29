use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Registered / active model counts; None when the database is unreadable
    #[serde(skip_serializing_if = "Option::is_none")]
    models: Option<ModelCounts>,
}

#[derive(Serialize)]
struct ModelCounts {
    total: usize,
    active: usize,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    match state.db.list_models() {
        Ok(models) => HttpResponse::Ok().json(HealthResponse {
            status: "ok",
            version: VERSION,
            models: Some(ModelCounts {
                total: models.len(),
                active: models.iter().filter(|m| m.is_active).count(),
            }),
        }),
        Err(e) => {
            log::error!("Health check could not read models: {}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded",
                version: VERSION,
                models: None,
            })
        }
    }
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
