use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod ai;
mod config;
mod controllers;
mod db;
mod models;

use ai::{Dispatcher, ProviderContext};
use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub dispatcher: Arc<Dispatcher>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).map_err(|e| {
        log::error!("Failed to initialize database: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let db = Arc::new(db);

    let provider_context = ProviderContext::from_env(config.endpoints.clone()).map_err(|e| {
        log::error!("Failed to initialize provider clients: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(provider_context)));

    match db.list_active_models() {
        Ok(models) => log::info!(
            "{} active model(s): {}",
            models.len(),
            models
                .iter()
                .map(|m| m.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Err(e) => log::warn!("Could not list active models: {}", e),
    }

    log::info!("Starting ChatList server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                dispatcher: Arc::clone(&dispatcher),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::models::config)
            .configure(controllers::prompts::config)
            .configure(controllers::settings::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
