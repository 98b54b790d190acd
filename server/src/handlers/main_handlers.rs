use crate::config::AppConfig;
use crate::database::Database;
use crate::error::AppError;
use crate::submission::uploads::UploadStore;
use actix_web::{web, HttpResponse, Result};
use shared_types::ServerStatus;
use std::sync::Arc;
use std::time::SystemTime;

pub struct AppState {
    pub database: Arc<Database>,
    pub uploads: Arc<UploadStore>,
    pub config: Arc<AppConfig>,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(database: Arc<Database>, uploads: Arc<UploadStore>, config: Arc<AppConfig>) -> Self {
        Self {
            database,
            uploads,
            config,
            start_time: SystemTime::now(),
        }
    }
}

pub async fn health_check(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let uptime = data
        .start_time
        .elapsed()
        .map_err(|e| AppError::Internal(format!("Failed to calculate uptime: {e}")))?
        .as_secs();

    let status = ServerStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime,
    };

    Ok(HttpResponse::Ok().json(status))
}
