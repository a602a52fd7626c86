//! Service request endpoints
//!
//! A service request is a patient's ask for a catalog service. It moves
//! through requested -> scheduled -> in_progress -> completed, or is
//! cancelled along the way.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::HomeCareServer;
use crate::types::PaginationParams;
use crate::utils::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_length};

pub const REQUEST_STATUSES: [&str; 5] = [
    "requested",
    "scheduled",
    "in_progress",
    "completed",
    "cancelled",
];

/// Allowed forward transitions for a service request.
fn transition_allowed(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        ("requested", "scheduled")
            | ("requested", "cancelled")
            | ("scheduled", "in_progress")
            | ("scheduled", "cancelled")
            | ("in_progress", "completed")
            | ("in_progress", "cancelled")
    )
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub status: String,
    pub requested_start: Option<DateTime<Utc>>,
    pub assigned_caregiver_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListServiceRequestsParams {
    pub patient_id: Option<Uuid>,
    pub status: Option<String>,
    pub assigned_caregiver_id: Option<Uuid>,
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequestRequest {
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub requested_start: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl RequestValidation for CreateServiceRequestRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(notes) = &self.notes {
            validate_length!(notes, 0, 2000, "Notes must be at most 2000 characters");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequestRequest {
    pub status: Option<String>,
    pub requested_start: Option<DateTime<Utc>>,
    pub assigned_caregiver_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl RequestValidation for UpdateServiceRequestRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(status) = &self.status {
            validate_field!(
                status,
                REQUEST_STATUSES.contains(&status.as_str()),
                "Status must be one of: requested, scheduled, in_progress, completed, cancelled"
            );
        }
        Ok(())
    }
}

/// List service requests
#[utoipa::path(
    get,
    path = "/api/v1/service-requests",
    params(ListServiceRequestsParams),
    responses(
        (status = 200, description = "Service requests retrieved successfully", body = Vec<ServiceRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-requests",
    security(("bearer_auth" = []))
)]
pub async fn list_service_requests(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListServiceRequestsParams>,
) -> Result<Json<ApiResponse<Vec<ServiceRequest>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM service_requests WHERE 1=1");
    query
        .filter_eq("patient_id", params.patient_id)
        .filter_eq("status", params.status.as_deref())
        .filter_eq("assigned_caregiver_id", params.assigned_caregiver_id)
        .order_by_created_desc()
        .paginate(params.page, params.page_size);

    let requests: Vec<ServiceRequest> = query.build().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM service_requests \
         WHERE ($1::uuid IS NULL OR patient_id = $1) \
           AND ($2::text IS NULL OR status = $2) \
           AND ($3::uuid IS NULL OR assigned_caregiver_id = $3)",
    )
    .bind(params.patient_id)
    .bind(params.status.as_deref())
    .bind(params.assigned_caregiver_id)
    .fetch_one(&server.db_pool)
    .await?;

    let pagination = PaginationParams {
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(pagination.wrap_response(requests, total_count)))
}

/// Create a service request
#[utoipa::path(
    post,
    path = "/api/v1/service-requests",
    request_body = CreateServiceRequestRequest,
    responses(
        (status = 201, description = "Service request created", body = ServiceRequest),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Patient or service not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-requests",
    security(("bearer_auth" = []))
)]
pub async fn create_service_request(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(request): Json<CreateServiceRequestRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceRequest>>), ApiError> {
    request.validate()?;

    // Only approved patients may request services.
    let patient_status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM patients WHERE id = $1",
    )
    .bind(request.patient_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("patient"))?;
    if patient_status != "approved" {
        return Err(ApiError::conflict(
            "Patient application must be approved before requesting services",
        ));
    }

    let created = sqlx::query_as::<_, ServiceRequest>(
        r#"
        INSERT INTO service_requests (
            id, patient_id, service_id, status, requested_start, notes,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, 'requested', $4, $5, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.patient_id)
    .bind(request.service_id)
    .bind(request.requested_start)
    .bind(&request.notes)
    .fetch_one(&server.db_pool)
    .await?;

    server
        .audit
        .log_action(&auth, "service_request", created.id, "create", None)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(created))))
}

/// Get a service request
#[utoipa::path(
    get,
    path = "/api/v1/service-requests/{request_id}",
    params(("request_id" = Uuid, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Service request retrieved successfully", body = ServiceRequest),
        (status = 404, description = "Service request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-requests",
    security(("bearer_auth" = []))
)]
pub async fn get_service_request(
    State(server): State<HomeCareServer>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ServiceRequest>>, ApiError> {
    let found = sqlx::query_as::<_, ServiceRequest>(
        "SELECT * FROM service_requests WHERE id = $1",
    )
    .bind(request_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("service request"))?;
    Ok(Json(api_success(found)))
}

/// Update a service request (status, assignment, schedule)
#[utoipa::path(
    put,
    path = "/api/v1/service-requests/{request_id}",
    request_body = UpdateServiceRequestRequest,
    params(("request_id" = Uuid, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Service request updated", body = ServiceRequest),
        (status = 404, description = "Service request not found"),
        (status = 409, description = "Invalid status transition"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "service-requests",
    security(("bearer_auth" = []))
)]
pub async fn update_service_request(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(request_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequestRequest>,
) -> Result<Json<ApiResponse<ServiceRequest>>, ApiError> {
    request.validate()?;

    let existing = sqlx::query_as::<_, ServiceRequest>(
        "SELECT * FROM service_requests WHERE id = $1",
    )
    .bind(request_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("service request"))?;

    if let Some(new_status) = &request.status {
        if new_status != &existing.status && !transition_allowed(&existing.status, new_status) {
            return Err(ApiError::conflict(format!(
                "Cannot move a {} request to {}",
                existing.status, new_status
            )));
        }
    }

    let updated = sqlx::query_as::<_, ServiceRequest>(
        r#"
        UPDATE service_requests SET
            status = COALESCE($2, status),
            requested_start = COALESCE($3, requested_start),
            assigned_caregiver_id = COALESCE($4, assigned_caregiver_id),
            notes = COALESCE($5, notes),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(request_id)
    .bind(&request.status)
    .bind(request.requested_start)
    .bind(request.assigned_caregiver_id)
    .bind(&request.notes)
    .fetch_one(&server.db_pool)
    .await?;

    server
        .audit
        .log_action(
            &auth,
            "service_request",
            request_id,
            "update",
            request
                .status
                .as_ref()
                .map(|s| serde_json::json!({ "status": s })),
        )
        .await?;

    Ok(Json(api_success(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(transition_allowed("requested", "scheduled"));
        assert!(transition_allowed("scheduled", "in_progress"));
        assert!(transition_allowed("in_progress", "completed"));
    }

    #[test]
    fn cancellation_allowed_until_completed() {
        assert!(transition_allowed("requested", "cancelled"));
        assert!(transition_allowed("scheduled", "cancelled"));
        assert!(transition_allowed("in_progress", "cancelled"));
        assert!(!transition_allowed("completed", "cancelled"));
    }

    #[test]
    fn backward_transitions_rejected() {
        assert!(!transition_allowed("completed", "in_progress"));
        assert!(!transition_allowed("scheduled", "requested"));
        assert!(!transition_allowed("cancelled", "scheduled"));
    }
}
