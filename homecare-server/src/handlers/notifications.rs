//! Notification endpoints
//!
//! Notifications are written by the alerting and scheduling flows (vital
//! alerts, visit reminders, review decisions) and read by client apps.

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
use crate::{validate_field, validate_length, validate_required};

pub const NOTIFICATION_TYPES: [&str; 5] = [
    "vital_alert",
    "visit_reminder",
    "visit_cancelled",
    "application_reviewed",
    "system",
];

pub const NOTIFICATION_PRIORITIES: [&str; 4] = ["low", "medium", "high", "critical"];

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    /// Optional link back to the entity that produced this notification
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListNotificationsParams {
    pub recipient_id: Option<Uuid>,
    pub notification_type: Option<String>,
    /// Only unread notifications when true
    pub unread_only: Option<bool>,
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    pub notification_type: String,
    pub priority: Option<String>,
    pub title: String,
    pub message: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl RequestValidation for CreateNotificationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.notification_type,
            NOTIFICATION_TYPES.contains(&self.notification_type.as_str()),
            "Notification type must be one of: vital_alert, visit_reminder, visit_cancelled, application_reviewed, system"
        );
        if let Some(priority) = &self.priority {
            validate_field!(
                priority,
                NOTIFICATION_PRIORITIES.contains(&priority.as_str()),
                "Priority must be one of: low, medium, high, critical"
            );
        }
        validate_required!(self.title, "Title is required");
        validate_length!(self.title, 1, 200, "Title must be between 1 and 200 characters");
        validate_required!(self.message, "Message is required");
        validate_length!(self.message, 1, 2000, "Message must be between 1 and 2000 characters");
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkMarkReadRequest {
    pub notification_ids: Vec<Uuid>,
}

impl RequestValidation for BulkMarkReadRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.notification_ids,
            !self.notification_ids.is_empty(),
            "At least one notification ID is required"
        );
        validate_field!(
            self.notification_ids,
            self.notification_ids.len() <= 100,
            "At most 100 notifications can be marked per request"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkMarkReadResponse {
    pub updated_count: u64,
}

/// List notifications, most recent first, excluding expired ones
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(ListNotificationsParams),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = Vec<Notification>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListNotificationsParams>,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let mut query = PaginatedQuery::new(
        "SELECT * FROM notifications WHERE (expires_at IS NULL OR expires_at > NOW())",
    );
    query
        .filter_eq("recipient_id", params.recipient_id)
        .filter_eq("notification_type", params.notification_type.as_deref());
    if params.unread_only.unwrap_or(false) {
        query.filter_eq("is_read", Some(false));
    }
    query
        .order_by_created_desc()
        .paginate(params.page, params.page_size);

    let notifications: Vec<Notification> = query.build().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications \
         WHERE (expires_at IS NULL OR expires_at > NOW()) \
           AND ($1::uuid IS NULL OR recipient_id = $1) \
           AND ($2::text IS NULL OR notification_type = $2) \
           AND (NOT $3 OR is_read = FALSE)",
    )
    .bind(params.recipient_id)
    .bind(params.notification_type.as_deref())
    .bind(params.unread_only.unwrap_or(false))
    .fetch_one(&server.db_pool)
    .await?;

    let pagination = PaginationParams {
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(pagination.wrap_response(notifications, total_count)))
}

/// Create a notification
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn create_notification(
    State(server): State<HomeCareServer>,
    _auth: AuthContext,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Notification>>), ApiError> {
    request.validate()?;

    let notification = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (
            id, recipient_id, notification_type, priority, title, message,
            related_entity_type, related_entity_id, is_read, expires_at,
            created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.recipient_id)
    .bind(&request.notification_type)
    .bind(request.priority.as_deref().unwrap_or("medium"))
    .bind(&request.title)
    .bind(&request.message)
    .bind(&request.related_entity_type)
    .bind(request.related_entity_id)
    .bind(request.expires_at)
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(notification))))
}

/// Mark one notification as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{notification_id}/read",
    params(("notification_id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = sqlx::query_as::<_, Notification>(
        r#"
        UPDATE notifications
        SET is_read = TRUE, read_at = NOW()
        WHERE id = $1 AND recipient_id = $2
        RETURNING *
        "#,
    )
    .bind(notification_id)
    .bind(auth.user_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("notification"))?;

    Ok(Json(api_success(notification)))
}

/// Mark a batch of notifications as read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/mark-read",
    request_body = BulkMarkReadRequest,
    responses(
        (status = 200, description = "Notifications marked as read", body = BulkMarkReadResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn bulk_mark_read(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(request): Json<BulkMarkReadRequest>,
) -> Result<Json<ApiResponse<BulkMarkReadResponse>>, ApiError> {
    request.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET is_read = TRUE, read_at = NOW()
        WHERE id = ANY($1) AND recipient_id = $2 AND is_read = FALSE
        "#,
    )
    .bind(&request.notification_ids)
    .bind(auth.user_id)
    .execute(&server.db_pool)
    .await?;

    Ok(Json(api_success(BulkMarkReadResponse {
        updated_count: result.rows_affected(),
    })))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{notification_id}",
    params(("notification_id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
        .bind(notification_id)
        .bind(auth.user_id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_rejects_unknown_type() {
        let request = CreateNotificationRequest {
            recipient_id: Uuid::new_v4(),
            notification_type: "carrier_pigeon".to_string(),
            priority: None,
            title: "Hello".to_string(),
            message: "World".to_string(),
            related_entity_type: None,
            related_entity_id: None,
            expires_at: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_request_accepts_vital_alert() {
        let request = CreateNotificationRequest {
            recipient_id: Uuid::new_v4(),
            notification_type: "vital_alert".to_string(),
            priority: Some("critical".to_string()),
            title: "Blood pressure alert".to_string(),
            message: "Systolic above threshold".to_string(),
            related_entity_type: Some("vital_alert".to_string()),
            related_entity_id: Some(Uuid::new_v4()),
            expires_at: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn bulk_mark_read_rejects_empty_batch() {
        let request = BulkMarkReadRequest {
            notification_ids: vec![],
        };
        assert!(request.validate().is_err());
    }
}
