//! Vital signs recording, alerting, and trend endpoints
//!
//! Handlers validate input sanity bounds (a reading that is physically
//! implausible is rejected with a 400) before handing off to the engine,
//! which applies the clinical alerting thresholds.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use vitals_engine::{
    NewVitalSigns, TimeRange, VitalAlert, VitalRange, VitalSigns, VitalType, VitalsTrend,
};

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::HomeCareServer;
use crate::types::PaginationParams;
use crate::validation::RequestValidation;
use crate::{validate_bounds, validate_field};

/// Sanity bounds for submitted readings, distinct from alerting thresholds
impl RequestValidation for RecordVitalsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(
            self.payload,
            !self.payload.is_empty(),
            "At least one vital value must be recorded"
        );
        if let Some(bp) = self.payload.blood_pressure {
            validate_field!(
                bp.systolic,
                (50..=250).contains(&bp.systolic),
                "Systolic pressure must be between 50 and 250"
            );
            validate_field!(
                bp.diastolic,
                (30..=150).contains(&bp.diastolic),
                "Diastolic pressure must be between 30 and 150"
            );
            validate_field!(
                bp,
                bp.systolic > bp.diastolic,
                "Systolic pressure must exceed diastolic pressure"
            );
        }
        validate_bounds!(
            self.payload.heart_rate,
            30,
            200,
            "Heart rate must be between 30 and 200"
        );
        validate_bounds!(
            self.payload.temperature,
            30.0,
            45.0,
            "Temperature must be between 30 and 45 °C"
        );
        validate_bounds!(
            self.payload.oxygen_saturation,
            50,
            100,
            "Oxygen saturation must be between 50 and 100 percent"
        );
        validate_bounds!(
            self.payload.weight,
            10.0,
            300.0,
            "Weight must be between 10 and 300 kg"
        );
        validate_bounds!(
            self.payload.blood_sugar,
            20.0,
            600.0,
            "Blood sugar must be between 20 and 600 mg/dL"
        );
        Ok(())
    }
}

/// Wrapper so validation can run before the payload reaches the engine
pub struct RecordVitalsRequest {
    payload: NewVitalSigns,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListVitalsParams {
    pub patient_id: Uuid,
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl ListVitalsParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TrendsParams {
    pub patient_id: Uuid,
    /// One of: bloodPressure, heartRate, temperature, oxygenSaturation,
    /// bloodSugar, weight
    pub vital_type: String,
    /// One of: 24h, 7d, 30d, 90d, 1y
    pub time_range: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAlertsParams {
    pub patient_id: Option<Uuid>,
    /// When true, only alerts nobody has acknowledged yet
    pub unacknowledged_only: Option<bool>,
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl ListAlertsParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Record a set of vital signs
///
/// Evaluates the submission against the configured normal ranges and
/// persists threshold alerts together with the vitals row. The response
/// carries the saved row; generated alerts are fetched separately.
#[utoipa::path(
    post,
    path = "/api/v1/vitals",
    request_body = NewVitalSigns,
    responses(
        (status = 201, description = "Vital signs recorded successfully", body = VitalSigns),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn record_vitals(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(payload): Json<NewVitalSigns>,
) -> Result<(StatusCode, Json<ApiResponse<VitalSigns>>), ApiError> {
    RecordVitalsRequest { payload: payload.clone() }.validate()?;

    let vitals = server.vitals.record_vitals(&payload).await?;

    server
        .audit
        .log_vitals_action(
            &auth,
            vitals.id,
            "create",
            Some(serde_json::json!({
                "alerted": vitals.is_alerted,
                "alertedValues": vitals.alerted_values,
            })),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(vitals))))
}

/// List a patient's vital signs history, most recent first
#[utoipa::path(
    get,
    path = "/api/v1/vitals",
    params(ListVitalsParams),
    responses(
        (status = 200, description = "Vital signs retrieved successfully", body = Vec<VitalSigns>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn list_vitals(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListVitalsParams>,
) -> Result<Json<ApiResponse<Vec<VitalSigns>>>, ApiError> {
    let pagination = params.pagination();
    let rows = server
        .vitals
        .vitals_for_patient(params.patient_id, pagination.limit(), pagination.offset())
        .await?;
    Ok(Json(api_success(rows)))
}

/// Get a single vital signs record
#[utoipa::path(
    get,
    path = "/api/v1/vitals/{vitals_id}",
    params(("vitals_id" = Uuid, Path, description = "Vital signs record ID")),
    responses(
        (status = 200, description = "Record retrieved successfully", body = VitalSigns),
        (status = 404, description = "Record not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn get_vitals(
    State(server): State<HomeCareServer>,
    Path(vitals_id): Path<Uuid>,
) -> Result<Json<ApiResponse<VitalSigns>>, ApiError> {
    let record = server.vitals.get_vitals(vitals_id).await?;
    Ok(Json(api_success(record)))
}

/// Compute rolling trends for one vital over a lookback window
#[utoipa::path(
    get,
    path = "/api/v1/vitals/trends",
    params(TrendsParams),
    responses(
        (status = 200, description = "Trend computed successfully", body = VitalsTrend),
        (status = 400, description = "Invalid vital type or time range"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn get_trends(
    State(server): State<HomeCareServer>,
    Query(params): Query<TrendsParams>,
) -> Result<Json<ApiResponse<VitalsTrend>>, ApiError> {
    let vital_type: VitalType = params
        .vital_type
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Unknown vital type: {}", params.vital_type)))?;
    let time_range: TimeRange = params
        .time_range
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Unknown time range: {}", params.time_range)))?;

    let trend = server
        .vitals
        .trends(params.patient_id, vital_type, time_range)
        .await?;
    Ok(Json(api_success(trend)))
}

/// List threshold alerts
#[utoipa::path(
    get,
    path = "/api/v1/vitals/alerts",
    params(ListAlertsParams),
    responses(
        (status = 200, description = "Alerts retrieved successfully", body = Vec<VitalAlert>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn list_alerts(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListAlertsParams>,
) -> Result<Json<ApiResponse<Vec<VitalAlert>>>, ApiError> {
    let pagination = params.pagination();
    let alerts = server
        .vitals
        .list_alerts(
            params.patient_id,
            params.unacknowledged_only.unwrap_or(false),
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
    Ok(Json(api_success(alerts)))
}

/// Acknowledge a threshold alert
#[utoipa::path(
    post,
    path = "/api/v1/vitals/alerts/{alert_id}/acknowledge",
    params(("alert_id" = Uuid, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert acknowledged", body = VitalAlert),
        (status = 404, description = "Alert not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn acknowledge_alert(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<ApiResponse<VitalAlert>>, ApiError> {
    let alert = server
        .vitals
        .acknowledge_alert(alert_id, auth.user_id)
        .await?;

    server
        .audit
        .log_action(&auth, "vital_alert", alert_id, "acknowledge", None)
        .await?;

    Ok(Json(api_success(alert)))
}

/// List configured normal ranges
#[utoipa::path(
    get,
    path = "/api/v1/vitals/ranges",
    responses(
        (status = 200, description = "Ranges retrieved successfully", body = Vec<VitalRange>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn list_ranges(
    State(server): State<HomeCareServer>,
) -> Result<Json<ApiResponse<Vec<VitalRange>>>, ApiError> {
    let ranges = server.vitals.load_ranges().await?;
    Ok(Json(api_success(ranges)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRangeRequest {
    pub name: String,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    /// "all" or a specific gender
    #[serde(default = "default_gender")]
    pub gender: String,
    pub systolic_min: Option<i32>,
    pub systolic_max: Option<i32>,
    pub diastolic_min: Option<i32>,
    pub diastolic_max: Option<i32>,
    pub heart_rate_min: Option<i32>,
    pub heart_rate_max: Option<i32>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub oxygen_saturation_min: Option<i32>,
    pub oxygen_saturation_max: Option<i32>,
    pub blood_sugar_min: Option<f64>,
    pub blood_sugar_max: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
}

fn default_gender() -> String {
    "all".to_string()
}

impl RequestValidation for CreateRangeRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_field!(self.name, !self.name.trim().is_empty(), "Range name is required");
        if let (Some(min), Some(max)) = (self.systolic_min, self.systolic_max) {
            validate_field!(min, min < max, "Systolic minimum must be below the maximum");
        }
        if let (Some(min), Some(max)) = (self.heart_rate_min, self.heart_rate_max) {
            validate_field!(min, min < max, "Heart rate minimum must be below the maximum");
        }
        Ok(())
    }
}

/// Add a normal range
#[utoipa::path(
    post,
    path = "/api/v1/vitals/ranges",
    request_body = CreateRangeRequest,
    responses(
        (status = 201, description = "Range created successfully", body = VitalRange),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "vitals",
    security(("bearer_auth" = []))
)]
pub async fn create_range(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(request): Json<CreateRangeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VitalRange>>), ApiError> {
    request.validate()?;

    let range = server
        .vitals
        .create_range(&VitalRange {
            id: Uuid::new_v4(),
            name: request.name,
            age_min: request.age_min,
            age_max: request.age_max,
            gender: request.gender,
            systolic_min: request.systolic_min,
            systolic_max: request.systolic_max,
            diastolic_min: request.diastolic_min,
            diastolic_max: request.diastolic_max,
            heart_rate_min: request.heart_rate_min,
            heart_rate_max: request.heart_rate_max,
            temperature_min: request.temperature_min,
            temperature_max: request.temperature_max,
            oxygen_saturation_min: request.oxygen_saturation_min,
            oxygen_saturation_max: request.oxygen_saturation_max,
            blood_sugar_min: request.blood_sugar_min,
            blood_sugar_max: request.blood_sugar_max,
            is_default: request.is_default,
            created_at: chrono::Utc::now(),
        })
        .await?;

    server
        .audit
        .log_action(&auth, "vital_range", range.id, "create", None)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(range))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_engine::BloodPressure;

    fn submission() -> NewVitalSigns {
        NewVitalSigns {
            patient_id: Uuid::new_v4(),
            caregiver_id: Uuid::new_v4(),
            recorded_at: None,
            blood_pressure: None,
            heart_rate: None,
            temperature: None,
            oxygen_saturation: None,
            weight: None,
            blood_sugar: None,
            notes: None,
        }
    }

    fn validate(payload: NewVitalSigns) -> Result<(), ApiError> {
        RecordVitalsRequest { payload }.validate()
    }

    #[test]
    fn empty_submission_is_rejected() {
        assert!(validate(submission()).is_err());
    }

    #[test]
    fn plausible_readings_pass() {
        let mut payload = submission();
        payload.blood_pressure = Some(BloodPressure {
            systolic: 120,
            diastolic: 80,
        });
        payload.heart_rate = Some(72);
        payload.temperature = Some(36.8);
        payload.oxygen_saturation = Some(98);
        payload.weight = Some(70.0);
        payload.blood_sugar = Some(95.0);
        assert!(validate(payload).is_ok());
    }

    #[test]
    fn systolic_must_exceed_diastolic() {
        let mut payload = submission();
        payload.blood_pressure = Some(BloodPressure {
            systolic: 80,
            diastolic: 80,
        });
        assert!(validate(payload).is_err());
    }

    #[test]
    fn blood_pressure_sanity_bounds() {
        let mut payload = submission();
        payload.blood_pressure = Some(BloodPressure {
            systolic: 260,
            diastolic: 80,
        });
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.blood_pressure = Some(BloodPressure {
            systolic: 120,
            diastolic: 20,
        });
        assert!(validate(payload).is_err());
    }

    #[test]
    fn heart_rate_sanity_bounds() {
        let mut payload = submission();
        payload.heart_rate = Some(29);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.heart_rate = Some(201);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.heart_rate = Some(30);
        assert!(validate(payload).is_ok());
    }

    #[test]
    fn temperature_sanity_bounds() {
        let mut payload = submission();
        payload.temperature = Some(46.0);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.temperature = Some(29.9);
        assert!(validate(payload).is_err());
    }

    #[test]
    fn oxygen_saturation_sanity_bounds() {
        let mut payload = submission();
        payload.oxygen_saturation = Some(101);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.oxygen_saturation = Some(49);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.oxygen_saturation = Some(50);
        assert!(validate(payload).is_ok());
    }

    #[test]
    fn weight_sanity_bounds() {
        let mut payload = submission();
        payload.weight = Some(9.9);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.weight = Some(301.0);
        assert!(validate(payload).is_err());
    }

    #[test]
    fn blood_sugar_sanity_bounds() {
        let mut payload = submission();
        payload.blood_sugar = Some(19.0);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.blood_sugar = Some(601.0);
        assert!(validate(payload).is_err());

        let mut payload = submission();
        payload.blood_sugar = Some(600.0);
        assert!(validate(payload).is_ok());
    }
}
