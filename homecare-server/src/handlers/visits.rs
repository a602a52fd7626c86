//! Visit scheduling endpoints
//!
//! Visits are the concrete scheduled appointments that fulfil a service
//! request. They carry a caregiver assignment, a time window, and a
//! reminder flag consumed by the notification pipeline.

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

pub const VISIT_STATUSES: [&str; 4] = ["scheduled", "in_progress", "completed", "cancelled"];

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub service_request_id: Option<Uuid>,
    pub caregiver_id: Uuid,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: String,
    pub visit_notes: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListVisitsParams {
    pub patient_id: Option<Uuid>,
    pub caregiver_id: Option<Uuid>,
    pub status: Option<String>,
    /// Only visits starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitRequest {
    pub patient_id: Uuid,
    pub service_request_id: Option<Uuid>,
    pub caregiver_id: Uuid,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub visit_notes: Option<String>,
}

impl RequestValidation for CreateVisitRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.scheduled_end,
            self.scheduled_end > self.scheduled_start,
            "Scheduled end must be after scheduled start"
        );
        if let Some(notes) = &self.visit_notes {
            validate_length!(notes, 0, 2000, "Visit notes must be at most 2000 characters");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitRequest {
    pub status: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub caregiver_id: Option<Uuid>,
    pub visit_notes: Option<String>,
}

impl RequestValidation for UpdateVisitRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(status) = &self.status {
            validate_field!(
                status,
                VISIT_STATUSES.contains(&status.as_str()),
                "Status must be one of: scheduled, in_progress, completed, cancelled"
            );
            validate_field!(
                status,
                status != "cancelled",
                "Use the cancel endpoint to cancel a visit"
            );
        }
        if let (Some(start), Some(end)) = (self.scheduled_start, self.scheduled_end) {
            validate_field!(
                self.scheduled_end,
                end > start,
                "Scheduled end must be after scheduled start"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelVisitRequest {
    pub reason: String,
}

impl RequestValidation for CancelVisitRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.reason,
            !self.reason.trim().is_empty(),
            "A cancellation reason is required"
        );
        Ok(())
    }
}

/// List visits
#[utoipa::path(
    get,
    path = "/api/v1/visits",
    params(ListVisitsParams),
    responses(
        (status = 200, description = "Visits retrieved successfully", body = Vec<Visit>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "visits",
    security(("bearer_auth" = []))
)]
pub async fn list_visits(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListVisitsParams>,
) -> Result<Json<ApiResponse<Vec<Visit>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM visits WHERE 1=1");
    query
        .filter_eq("patient_id", params.patient_id)
        .filter_eq("caregiver_id", params.caregiver_id)
        .filter_eq("status", params.status.as_deref());
    if let Some(from) = params.from {
        query.filter_gte("scheduled_start", from);
    }
    query
        .order_by("scheduled_start", "ASC")
        .paginate(params.page, params.page_size);

    let visits: Vec<Visit> = query.build().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM visits \
         WHERE ($1::uuid IS NULL OR patient_id = $1) \
           AND ($2::uuid IS NULL OR caregiver_id = $2) \
           AND ($3::text IS NULL OR status = $3) \
           AND ($4::timestamptz IS NULL OR scheduled_start >= $4)",
    )
    .bind(params.patient_id)
    .bind(params.caregiver_id)
    .bind(params.status.as_deref())
    .bind(params.from)
    .fetch_one(&server.db_pool)
    .await?;

    let pagination = PaginationParams {
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(pagination.wrap_response(visits, total_count)))
}

/// Schedule a visit
#[utoipa::path(
    post,
    path = "/api/v1/visits",
    request_body = CreateVisitRequest,
    responses(
        (status = 201, description = "Visit scheduled", body = Visit),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Caregiver double-booked"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "visits",
    security(("bearer_auth" = []))
)]
pub async fn create_visit(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(request): Json<CreateVisitRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Visit>>), ApiError> {
    request.validate()?;

    // Reject overlapping active visits for the same caregiver.
    let overlapping = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM visits \
         WHERE caregiver_id = $1 \
           AND status IN ('scheduled', 'in_progress') \
           AND scheduled_start < $3 AND scheduled_end > $2",
    )
    .bind(request.caregiver_id)
    .bind(request.scheduled_start)
    .bind(request.scheduled_end)
    .fetch_one(&server.db_pool)
    .await?;
    if overlapping > 0 {
        return Err(ApiError::conflict(
            "Caregiver already has a visit in this time window",
        ));
    }

    let visit = sqlx::query_as::<_, Visit>(
        r#"
        INSERT INTO visits (
            id, patient_id, service_request_id, caregiver_id,
            scheduled_start, scheduled_end, status, visit_notes,
            reminder_sent, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', $7, FALSE, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.patient_id)
    .bind(request.service_request_id)
    .bind(request.caregiver_id)
    .bind(request.scheduled_start)
    .bind(request.scheduled_end)
    .bind(&request.visit_notes)
    .fetch_one(&server.db_pool)
    .await?;

    server
        .audit
        .log_visit_action(&auth, visit.id, "create", None)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(visit))))
}

/// Get a visit
#[utoipa::path(
    get,
    path = "/api/v1/visits/{visit_id}",
    params(("visit_id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit retrieved successfully", body = Visit),
        (status = 404, description = "Visit not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "visits",
    security(("bearer_auth" = []))
)]
pub async fn get_visit(
    State(server): State<HomeCareServer>,
    Path(visit_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Visit>>, ApiError> {
    let visit = sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE id = $1")
        .bind(visit_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("visit"))?;
    Ok(Json(api_success(visit)))
}

/// Update a visit's schedule, status, or notes
#[utoipa::path(
    put,
    path = "/api/v1/visits/{visit_id}",
    request_body = UpdateVisitRequest,
    params(("visit_id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit updated", body = Visit),
        (status = 404, description = "Visit not found"),
        (status = 409, description = "Visit already finished"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "visits",
    security(("bearer_auth" = []))
)]
pub async fn update_visit(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(visit_id): Path<Uuid>,
    Json(request): Json<UpdateVisitRequest>,
) -> Result<Json<ApiResponse<Visit>>, ApiError> {
    request.validate()?;

    let updated = sqlx::query_as::<_, Visit>(
        r#"
        UPDATE visits SET
            status = COALESCE($2, status),
            scheduled_start = COALESCE($3, scheduled_start),
            scheduled_end = COALESCE($4, scheduled_end),
            caregiver_id = COALESCE($5, caregiver_id),
            visit_notes = COALESCE($6, visit_notes),
            updated_at = NOW()
        WHERE id = $1 AND status IN ('scheduled', 'in_progress')
        RETURNING *
        "#,
    )
    .bind(visit_id)
    .bind(&request.status)
    .bind(request.scheduled_start)
    .bind(request.scheduled_end)
    .bind(request.caregiver_id)
    .bind(&request.visit_notes)
    .fetch_optional(&server.db_pool)
    .await?;

    let visit = match updated {
        Some(visit) => visit,
        None => {
            let exists =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits WHERE id = $1")
                    .bind(visit_id)
                    .fetch_one(&server.db_pool)
                    .await?;
            return if exists == 0 {
                Err(ApiError::not_found("visit"))
            } else {
                Err(ApiError::conflict("Visit is already completed or cancelled"))
            };
        }
    };

    server
        .audit
        .log_visit_action(&auth, visit_id, "update", None)
        .await?;

    Ok(Json(api_success(visit)))
}

/// Cancel a visit
#[utoipa::path(
    post,
    path = "/api/v1/visits/{visit_id}/cancel",
    request_body = CancelVisitRequest,
    params(("visit_id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit cancelled", body = Visit),
        (status = 404, description = "Visit not found"),
        (status = 409, description = "Visit already finished"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "visits",
    security(("bearer_auth" = []))
)]
pub async fn cancel_visit(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(visit_id): Path<Uuid>,
    Json(request): Json<CancelVisitRequest>,
) -> Result<Json<ApiResponse<Visit>>, ApiError> {
    request.validate()?;

    let cancelled = sqlx::query_as::<_, Visit>(
        r#"
        UPDATE visits SET
            status = 'cancelled',
            cancelled_by = $2,
            cancellation_reason = $3,
            updated_at = NOW()
        WHERE id = $1 AND status IN ('scheduled', 'in_progress')
        RETURNING *
        "#,
    )
    .bind(visit_id)
    .bind(auth.user_id)
    .bind(&request.reason)
    .fetch_optional(&server.db_pool)
    .await?;

    let visit = match cancelled {
        Some(visit) => visit,
        None => {
            let exists =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits WHERE id = $1")
                    .bind(visit_id)
                    .fetch_one(&server.db_pool)
                    .await?;
            return if exists == 0 {
                Err(ApiError::not_found("visit"))
            } else {
                Err(ApiError::conflict("Visit is already completed or cancelled"))
            };
        }
    };

    server
        .audit
        .log_visit_action(
            &auth,
            visit_id,
            "cancel",
            Some(serde_json::json!({ "reason": request.reason })),
        )
        .await?;

    Ok(Json(api_success(visit)))
}
