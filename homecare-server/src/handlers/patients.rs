//! Patient intake and management endpoints
//!
//! A patient record starts life as a pending application and is approved
//! or rejected by an administrator before any scheduling happens.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
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

/// Patient application lifecycle: pending -> approved | rejected
pub const PATIENT_STATUSES: [&str; 3] = ["pending", "approved", "rejected"];

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    /// Requested care level, free-form catalog reference
    pub care_level: Option<String>,
    pub medical_notes: Option<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPatientsParams {
    pub status: Option<String>,
    pub care_level: Option<String>,
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub care_level: Option<String>,
    pub medical_notes: Option<String>,
}

impl RequestValidation for CreatePatientRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.full_name, "Full name is required");
        validate_length!(self.full_name, 2, 200, "Full name must be between 2 and 200 characters");
        validate_required!(self.gender, "Gender is required");
        validate_field!(
            self.date_of_birth,
            self.date_of_birth <= Utc::now().date_naive(),
            "Date of birth must not be in the future"
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub care_level: Option<String>,
    pub medical_notes: Option<String>,
}

impl RequestValidation for UpdatePatientRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.full_name {
            validate_required!(name, "Full name must not be blank");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatientRequest {
    /// "approved" or "rejected"
    pub status: String,
    pub rejection_reason: Option<String>,
}

impl RequestValidation for ReviewPatientRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.status,
            self.status == "approved" || self.status == "rejected",
            "Review status must be approved or rejected"
        );
        if self.status == "rejected" {
            validate_field!(
                self.rejection_reason,
                self.rejection_reason
                    .as_deref()
                    .is_some_and(|r| !r.trim().is_empty()),
                "A rejection reason is required when rejecting"
            );
        }
        Ok(())
    }
}

/// List patients
#[utoipa::path(
    get,
    path = "/api/v1/patients",
    params(ListPatientsParams),
    responses(
        (status = 200, description = "Patients retrieved successfully", body = Vec<Patient>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn list_patients(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListPatientsParams>,
) -> Result<Json<ApiResponse<Vec<Patient>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
    query
        .filter_eq("status", params.status.as_deref())
        .filter_eq("care_level", params.care_level.as_deref())
        .order_by_created_desc()
        .paginate(params.page, params.page_size);

    let patients: Vec<Patient> = query.build().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM patients \
         WHERE ($1::text IS NULL OR status = $1) \
           AND ($2::text IS NULL OR care_level = $2)",
    )
    .bind(params.status.as_deref())
    .bind(params.care_level.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    let pagination = PaginationParams {
        page: params.page,
        page_size: params.page_size,
    };
    Ok(Json(pagination.wrap_response(patients, total_count)))
}

/// Submit a patient application
#[utoipa::path(
    post,
    path = "/api/v1/patients",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient application created", body = Patient),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn create_patient(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Patient>>), ApiError> {
    request.validate()?;

    let patient = sqlx::query_as::<_, Patient>(
        r#"
        INSERT INTO patients (
            id, full_name, date_of_birth, gender, address, phone,
            emergency_contact, care_level, medical_notes, status,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.full_name)
    .bind(request.date_of_birth)
    .bind(&request.gender)
    .bind(&request.address)
    .bind(&request.phone)
    .bind(&request.emergency_contact)
    .bind(&request.care_level)
    .bind(&request.medical_notes)
    .fetch_one(&server.db_pool)
    .await?;

    server
        .audit
        .log_patient_action(&auth, patient.id, "create", None)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(patient))))
}

/// Get a patient
#[utoipa::path(
    get,
    path = "/api/v1/patients/{patient_id}",
    params(("patient_id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient retrieved successfully", body = Patient),
        (status = 404, description = "Patient not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn get_patient(
    State(server): State<HomeCareServer>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Patient>>, ApiError> {
    let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
        .bind(patient_id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("patient"))?;
    Ok(Json(api_success(patient)))
}

/// Update a patient's demographics
#[utoipa::path(
    put,
    path = "/api/v1/patients/{patient_id}",
    request_body = UpdatePatientRequest,
    params(("patient_id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient updated successfully", body = Patient),
        (status = 404, description = "Patient not found"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn update_patient(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<ApiResponse<Patient>>, ApiError> {
    request.validate()?;

    let patient = sqlx::query_as::<_, Patient>(
        r#"
        UPDATE patients SET
            full_name = COALESCE($2, full_name),
            address = COALESCE($3, address),
            phone = COALESCE($4, phone),
            emergency_contact = COALESCE($5, emergency_contact),
            care_level = COALESCE($6, care_level),
            medical_notes = COALESCE($7, medical_notes),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(patient_id)
    .bind(&request.full_name)
    .bind(&request.address)
    .bind(&request.phone)
    .bind(&request.emergency_contact)
    .bind(&request.care_level)
    .bind(&request.medical_notes)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("patient"))?;

    server
        .audit
        .log_patient_action(&auth, patient_id, "update", None)
        .await?;

    Ok(Json(api_success(patient)))
}

/// Approve or reject a pending patient application
#[utoipa::path(
    post,
    path = "/api/v1/patients/{patient_id}/review",
    request_body = ReviewPatientRequest,
    params(("patient_id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Application reviewed", body = Patient),
        (status = 404, description = "Patient not found"),
        (status = 409, description = "Application already reviewed"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn review_patient(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<ReviewPatientRequest>,
) -> Result<Json<ApiResponse<Patient>>, ApiError> {
    request.validate()?;

    let updated = sqlx::query_as::<_, Patient>(
        r#"
        UPDATE patients SET
            status = $2,
            reviewed_by = $3,
            reviewed_at = NOW(),
            rejection_reason = $4,
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(patient_id)
    .bind(&request.status)
    .bind(auth.user_id)
    .bind(&request.rejection_reason)
    .fetch_optional(&server.db_pool)
    .await?;

    let patient = match updated {
        Some(patient) => patient,
        None => {
            // Distinguish missing from already-reviewed for the caller.
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM patients WHERE id = $1",
            )
            .bind(patient_id)
            .fetch_one(&server.db_pool)
            .await?;
            return if exists == 0 {
                Err(ApiError::not_found("patient"))
            } else {
                Err(ApiError::conflict("Patient application already reviewed"))
            };
        }
    };

    server
        .audit
        .log_patient_action(
            &auth,
            patient_id,
            "review",
            Some(serde_json::json!({ "status": request.status })),
        )
        .await?;

    Ok(Json(api_success(patient)))
}
