use crate::services::orchestrator::ScanOrchestrator;
use actix_web::{HttpResponse, Result as ActixResult, web};
use log::error;
use serde::Deserialize;
use std::sync::Arc;

pub struct AppState {
    pub orchestrator: Arc<ScanOrchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub target: String,
}

pub async fn start_scan(
    body: web::Json<ScanRequest>,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    match data.orchestrator.start_scan(&body.target).await {
        Ok(snapshot) => Ok(HttpResponse::Accepted().json(snapshot)),
        Err(e) => {
            error!("Rejected scan request: {}", e);
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
    }
}

pub async fn get_scan(data: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.orchestrator.snapshot().await))
}

pub async fn reset_scan(data: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.orchestrator.reset().await))
}
