use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub value: String,
}

#[derive(Serialize)]
pub struct SettingResponse {
    pub success: bool,
    pub key: String,
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/settings/{key}")
            .route(web::get().to(get_setting))
            .route(web::put().to(set_setting)),
    );
}

async fn get_setting(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let key = path.into_inner();

    match state.db.get_setting(&key) {
        Ok(value) => HttpResponse::Ok().json(SettingResponse {
            success: true,
            key,
            value,
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to read setting {}: {}", key, e);
            HttpResponse::InternalServerError().json(SettingResponse {
                success: false,
                key,
                value: None,
                error: Some("Failed to read setting".to_string()),
            })
        }
    }
}

async fn set_setting(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SetSettingRequest>,
) -> impl Responder {
    let key = path.into_inner();

    match state.db.set_setting(&key, &body.value) {
        Ok(()) => HttpResponse::Ok().json(SettingResponse {
            success: true,
            key,
            value: Some(body.into_inner().value),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to write setting {}: {}", key, e);
            HttpResponse::InternalServerError().json(SettingResponse {
                success: false,
                key,
                value: None,
                error: Some("Failed to save setting".to_string()),
            })
        }
    }
}
