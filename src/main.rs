use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use dotenv::dotenv;
use log::{info, warn};
use std::env;
use std::sync::Arc;
use std::time::Duration;

mod handlers;
mod models;
mod services;
mod utils;

use handlers::scan::{AppState, get_scan, reset_scan, start_scan};
use services::gemini::GeminiClient;
use services::orchestrator::{DEFAULT_STEP_DELAY_MS, ScanOrchestrator};

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "vulnerax"
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let gemini_api_key = env::var("GEMINI_API_KEY").ok();
    let gemini_model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());
    let step_delay_ms = env::var("SCAN_STEP_DELAY_MS")
        .unwrap_or_else(|_| DEFAULT_STEP_DELAY_MS.to_string())
        .parse::<u64>()
        .unwrap_or(DEFAULT_STEP_DELAY_MS);

    if gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set, every report will use fallback data");
    }

    let mut gemini_client = GeminiClient::new(gemini_api_key, gemini_model);
    if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
        gemini_client = gemini_client.with_base_url(base_url);
    }

    let orchestrator = Arc::new(ScanOrchestrator::new(
        Arc::new(gemini_client),
        Duration::from_millis(step_delay_ms),
    ));

    let app_state = web::Data::new(AppState { orchestrator });

    let bind_addr = format!("{}:{}", host, port);
    info!("Starting server on {}", bind_addr);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .route("/health", web::get().to(health_check))
            .route("/api/scan", web::get().to(get_scan))
            .route("/api/scan", web::post().to(start_scan))
            .route("/api/reset", web::post().to(reset_scan))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
