use axum::{extract::State, http::StatusCode, response::Json as ResponseJson, Json};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::server::HomeCareServer;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub checks: HashMap<String, String>,
}

/// Version information response
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub features: Vec<String>,
}

/// System status response
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub server_name: String,
    pub database: String,
    pub services: HashMap<String, String>,
}

/// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health report", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(server): State<HomeCareServer>,
) -> Result<ResponseJson<HealthResponse>, StatusCode> {
    let mut checks = HashMap::new();

    let database = match sqlx::query("SELECT 1").execute(&server.db_pool).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };
    checks.insert("database".to_string(), database.to_string());

    let status = if database == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    };

    Ok(Json(response))
}

/// System status handler
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Subsystem status report", body = StatusResponse)
    ),
    tag = "health"
)]
pub async fn system_status(
    State(server): State<HomeCareServer>,
) -> Result<ResponseJson<StatusResponse>, StatusCode> {
    let database = match sqlx::query("SELECT 1").execute(&server.db_pool).await {
        Ok(_) => "running",
        Err(_) => "unreachable",
    };

    let mut services = HashMap::new();
    services.insert("catalog".to_string(), "running".to_string());
    services.insert("vitals".to_string(), "running".to_string());
    services.insert("audit".to_string(), "running".to_string());

    let response = StatusResponse {
        server_name: server.config.name.clone(),
        database: database.to_string(),
        services,
    };

    Ok(Json(response))
}

/// Version information handler
#[utoipa::path(
    get,
    path = "/version",
    responses(
        (status = 200, description = "Build version and feature list", body = VersionResponse)
    ),
    tag = "health"
)]
pub async fn version_info() -> Result<ResponseJson<VersionResponse>, StatusCode> {
    let features = vec![
        "service-catalog".to_string(),
        "vitals-alerting".to_string(),
        "trend-analysis".to_string(),
        "audit-logging".to_string(),
    ];

    let response = VersionResponse {
        name: "HomeCare Platform".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features,
    };

    Ok(Json(response))
}
