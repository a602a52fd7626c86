//! Medication tracking endpoints
//!
//! Medications are prescribed per patient; each administration during a
//! visit is logged separately so adherence can be reviewed over time.

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

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub dosage: String,
    /// Free-form schedule, e.g. "twice daily with meals"
    pub frequency: String,
    pub route: Option<String>,
    pub prescribed_by: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAdministration {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub administered_by: Uuid,
    pub administered_at: DateTime<Utc>,
    /// "given", "refused", or "missed"
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const ADMINISTRATION_STATUSES: [&str; 3] = ["given", "refused", "missed"];

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMedicationsParams {
    pub patient_id: Option<Uuid>,
    /// Only active prescriptions when true
    pub active_only: Option<bool>,
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicationRequest {
    pub patient_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub route: Option<String>,
    pub prescribed_by: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
}

impl RequestValidation for CreateMedicationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Medication name is required");
        validate_length!(self.name, 1, 200, "Medication name must be between 1 and 200 characters");
        validate_required!(self.dosage, "Dosage is required");
        validate_required!(self.frequency, "Frequency is required");
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            validate_field!(self.end_date, end > start, "End date must be after start date");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicationRequest {
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub route: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    pub is_active: Option<bool>,
}

impl RequestValidation for UpdateMedicationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(dosage) = &self.dosage {
            validate_required!(dosage, "Dosage must not be blank");
        }
        if let Some(frequency) = &self.frequency {
            validate_required!(frequency, "Frequency must not be blank");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordAdministrationRequest {
    pub administered_at: Option<DateTime<Utc>>,
    pub status: String,
    pub notes: Option<String>,
}

impl RequestValidation for RecordAdministrationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.status,
            ADMINISTRATION_STATUSES.contains(&self.status.as_str()),
            "Status must be one of: given, refused, missed"
        );
        if let Some(notes) = &self.notes {
            validate_length!(notes, 0, 1000, "Notes must be at most 1000 characters");
        }
        Ok(())
    }
}

/// List medications
#[utoipa::path(
    get,
    path = "/api/v1/medications",
    params(ListMedicationsParams),
    responses(
        (status = 200, description = "Medications retrieved successfully", body = Vec<Medication>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medications",
    security(("bearer_auth" = []))
)]
pub async fn list_medications(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListMedicationsParams>,
) -> Result<Json<ApiResponse<Vec<Medication>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM medications WHERE 1=1");
    query.filter_patient(params.patient_id);
    if params.active_only.unwrap_or(false) {
        query.filter_active();
    }
    query
        .order_by_created_desc()
        .paginate(params.page, params.page_size);

    let medications: Vec<Medication> = query.build().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM medications \
         WHERE ($1::uuid IS NULL OR patient_id = $1) \
           AND (NOT $2 OR is_active = TRUE)",
    )
    .bind(params.patient_id)
    .bind(params.active_only.unwrap_or(false))
    .fetch_one(&server.db_pool)
    .await?;

    let pagination = PaginationParams {
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(pagination.wrap_response(medications, total_count)))
}

/// Prescribe a medication
#[utoipa::path(
    post,
    path = "/api/v1/medications",
    request_body = CreateMedicationRequest,
    responses(
        (status = 201, description = "Medication created", body = Medication),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medications",
    security(("bearer_auth" = []))
)]
pub async fn create_medication(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(request): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Medication>>), ApiError> {
    request.validate()?;

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medications (
            id, patient_id, name, dosage, frequency, route, prescribed_by,
            start_date, end_date, instructions, is_active, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.patient_id)
    .bind(&request.name)
    .bind(&request.dosage)
    .bind(&request.frequency)
    .bind(&request.route)
    .bind(&request.prescribed_by)
    .bind(request.start_date)
    .bind(request.end_date)
    .bind(&request.instructions)
    .fetch_one(&server.db_pool)
    .await?;

    server
        .audit
        .log_action(&auth, "medication", medication.id, "create", None)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(medication))))
}

/// Get a medication
#[utoipa::path(
    get,
    path = "/api/v1/medications/{medication_id}",
    params(("medication_id" = Uuid, Path, description = "Medication ID")),
    responses(
        (status = 200, description = "Medication retrieved successfully", body = Medication),
        (status = 404, description = "Medication not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medications",
    security(("bearer_auth" = []))
)]
pub async fn get_medication(
    State(server): State<HomeCareServer>,
    Path(medication_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Medication>>, ApiError> {
    let medication = sqlx::query_as::<_, Medication>("SELECT * FROM medications WHERE id = $1")
        .bind(medication_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("medication"))?;
    Ok(Json(api_success(medication)))
}

/// Update a medication
#[utoipa::path(
    put,
    path = "/api/v1/medications/{medication_id}",
    request_body = UpdateMedicationRequest,
    params(("medication_id" = Uuid, Path, description = "Medication ID")),
    responses(
        (status = 200, description = "Medication updated", body = Medication),
        (status = 404, description = "Medication not found"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medications",
    security(("bearer_auth" = []))
)]
pub async fn update_medication(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(medication_id): Path<Uuid>,
    Json(request): Json<UpdateMedicationRequest>,
) -> Result<Json<ApiResponse<Medication>>, ApiError> {
    request.validate()?;

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications SET
            dosage = COALESCE($2, dosage),
            frequency = COALESCE($3, frequency),
            route = COALESCE($4, route),
            end_date = COALESCE($5, end_date),
            instructions = COALESCE($6, instructions),
            is_active = COALESCE($7, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(medication_id)
    .bind(&request.dosage)
    .bind(&request.frequency)
    .bind(&request.route)
    .bind(request.end_date)
    .bind(&request.instructions)
    .bind(request.is_active)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("medication"))?;

    server
        .audit
        .log_action(&auth, "medication", medication_id, "update", None)
        .await?;

    Ok(Json(api_success(medication)))
}

/// List administrations for a medication, most recent first
#[utoipa::path(
    get,
    path = "/api/v1/medications/{medication_id}/administrations",
    params(
        ("medication_id" = Uuid, Path, description = "Medication ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Administrations retrieved successfully", body = Vec<MedicationAdministration>),
        (status = 404, description = "Medication not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medications",
    security(("bearer_auth" = []))
)]
pub async fn list_administrations(
    State(server): State<HomeCareServer>,
    Path(medication_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<Vec<MedicationAdministration>>>, ApiError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM medications WHERE id = $1")
        .bind(medication_id)
        .fetch_one(&server.db_pool)
        .await?;
    if exists == 0 {
        return Err(ApiError::not_found("medication"));
    }

    let administrations = sqlx::query_as::<_, MedicationAdministration>(
        "SELECT * FROM medication_administrations \
         WHERE medication_id = $1 \
         ORDER BY administered_at DESC \
         LIMIT $2 OFFSET $3",
    )
    .bind(medication_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&server.db_pool)
    .await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM medication_administrations WHERE medication_id = $1",
    )
    .bind(medication_id)
    .fetch_one(&server.db_pool)
    .await?;

    Ok(Json(pagination.wrap_response(administrations, total_count)))
}

/// Record an administration (given, refused, or missed dose)
#[utoipa::path(
    post,
    path = "/api/v1/medications/{medication_id}/administrations",
    request_body = RecordAdministrationRequest,
    params(("medication_id" = Uuid, Path, description = "Medication ID")),
    responses(
        (status = 201, description = "Administration recorded", body = MedicationAdministration),
        (status = 404, description = "Medication not found"),
        (status = 409, description = "Medication is inactive"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medications",
    security(("bearer_auth" = []))
)]
pub async fn record_administration(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(medication_id): Path<Uuid>,
    Json(request): Json<RecordAdministrationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MedicationAdministration>>), ApiError> {
    request.validate()?;

    let is_active = sqlx::query_scalar::<_, bool>(
        "SELECT is_active FROM medications WHERE id = $1",
    )
    .bind(medication_id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("medication"))?;
    if !is_active {
        return Err(ApiError::conflict(
            "Cannot record an administration for an inactive medication",
        ));
    }

    let administration = sqlx::query_as::<_, MedicationAdministration>(
        r#"
        INSERT INTO medication_administrations (
            id, medication_id, administered_by, administered_at, status,
            notes, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(medication_id)
    .bind(auth.user_id)
    .bind(request.administered_at.unwrap_or_else(Utc::now))
    .bind(&request.status)
    .bind(&request.notes)
    .fetch_one(&server.db_pool)
    .await?;

    server
        .audit
        .log_action(
            &auth,
            "medication",
            medication_id,
            "administer",
            Some(serde_json::json!({ "status": request.status })),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(administration))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_medication_requires_name() {
        let request = CreateMedicationRequest {
            patient_id: Uuid::new_v4(),
            name: "".to_string(),
            dosage: "5mg".to_string(),
            frequency: "daily".to_string(),
            route: None,
            prescribed_by: None,
            start_date: None,
            end_date: None,
            instructions: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn administration_rejects_unknown_status() {
        let request = RecordAdministrationRequest {
            administered_at: None,
            status: "forgot".to_string(),
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn administration_accepts_refused() {
        let request = RecordAdministrationRequest {
            administered_at: Some(Utc::now()),
            status: "refused".to_string(),
            notes: Some("Patient declined morning dose".to_string()),
        };
        assert!(request.validate().is_ok());
    }
}
