use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Compound blood pressure reading in mmHg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BloodPressure {
    pub systolic: i32,
    pub diastolic: i32,
}

/// Persisted vital signs record
///
/// Created once by a caregiver submission and immutable afterwards except
/// for explicit note corrections. `is_alerted` and `alerted_values` are
/// derived at creation time by the alert engine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub caregiver_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,
    /// Body temperature in °C
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// SpO2 percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<i32>,
    /// Body weight in kg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Blood glucose in mg/dL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_alerted: bool,
    pub alerted_values: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Blood pressure is stored as two columns; compose the compound reading
// only when both are present.
impl FromRow<'_, PgRow> for VitalSigns {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let systolic: Option<i32> = row.try_get("blood_pressure_systolic")?;
        let diastolic: Option<i32> = row.try_get("blood_pressure_diastolic")?;
        let blood_pressure = match (systolic, diastolic) {
            (Some(systolic), Some(diastolic)) => Some(BloodPressure {
                systolic,
                diastolic,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            caregiver_id: row.try_get("caregiver_id")?,
            recorded_at: row.try_get("recorded_at")?,
            blood_pressure,
            heart_rate: row.try_get("heart_rate")?,
            temperature: row.try_get("temperature")?,
            oxygen_saturation: row.try_get("oxygen_saturation")?,
            weight: row.try_get("weight")?,
            blood_sugar: row.try_get("blood_sugar")?,
            notes: row.try_get("notes")?,
            is_alerted: row.try_get("is_alerted")?,
            alerted_values: row.try_get("alerted_values")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Caregiver submission payload, pre-validated at the handler layer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewVitalSigns {
    pub patient_id: Uuid,
    pub caregiver_id: Uuid,
    /// Defaults to now when omitted
    pub recorded_at: Option<DateTime<Utc>>,
    pub blood_pressure: Option<BloodPressure>,
    pub heart_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub oxygen_saturation: Option<i32>,
    pub weight: Option<f64>,
    pub blood_sugar: Option<f64>,
    pub notes: Option<String>,
}

impl NewVitalSigns {
    /// True when no vital value is supplied at all
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_none()
            && self.heart_rate.is_none()
            && self.temperature.is_none()
            && self.oxygen_saturation.is_none()
            && self.weight.is_none()
            && self.blood_sugar.is_none()
    }
}

/// Age/gender-scoped normal ranges, reference data for the alert engine
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VitalRange {
    pub id: Uuid,
    pub name: String,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    /// "all" or a specific gender
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
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Vital field a threshold alert can fire on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum VitalType {
    BloodPressure,
    HeartRate,
    Temperature,
    OxygenSaturation,
    BloodSugar,
    Weight,
}

impl VitalType {
    /// Wire/field name, matching the JSON payload field
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalType::BloodPressure => "bloodPressure",
            VitalType::HeartRate => "heartRate",
            VitalType::Temperature => "temperature",
            VitalType::OxygenSaturation => "oxygenSaturation",
            VitalType::BloodSugar => "bloodSugar",
            VitalType::Weight => "weight",
        }
    }
}

impl fmt::Display for VitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unknown vital type: {0}")]
pub struct ParseVitalTypeError(String);

impl FromStr for VitalType {
    type Err = ParseVitalTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bloodPressure" => Ok(VitalType::BloodPressure),
            "heartRate" => Ok(VitalType::HeartRate),
            "temperature" => Ok(VitalType::Temperature),
            "oxygenSaturation" => Ok(VitalType::OxygenSaturation),
            "bloodSugar" => Ok(VitalType::BloodSugar),
            "weight" => Ok(VitalType::Weight),
            other => Err(ParseVitalTypeError(other.to_string())),
        }
    }
}

/// Alert severity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unknown alert severity: {0}")]
pub struct ParseSeverityError(String);

impl FromStr for AlertSeverity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AlertSeverity::Low),
            "medium" => Ok(AlertSeverity::Medium),
            "high" => Ok(AlertSeverity::High),
            "critical" => Ok(AlertSeverity::Critical),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

/// Persisted threshold alert
///
/// Created synchronously with the vitals row that triggered it, mutated
/// once on acknowledgement, never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalAlert {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub vital_signs_id: Uuid,
    pub caregiver_id: Uuid,
    pub vital_type: VitalType,
    /// JSON-encoded actual value (object for compound types)
    pub actual_value: String,
    /// JSON-encoded expected-range bounds
    pub expected_range: String,
    pub severity: AlertSeverity,
    pub is_acknowledged: bool,
    pub acknowledged_by: Option<Uuid>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub notifications_sent: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, PgRow> for VitalAlert {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let vital_type: String = row.try_get("vital_type")?;
        let severity: String = row.try_get("severity")?;
        Ok(Self {
            id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            vital_signs_id: row.try_get("vital_signs_id")?,
            caregiver_id: row.try_get("caregiver_id")?,
            vital_type: vital_type.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "vital_type".into(),
                source: Box::new(e),
            })?,
            actual_value: row.try_get("actual_value")?,
            expected_range: row.try_get("expected_range")?,
            severity: severity.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "severity".into(),
                source: Box::new(e),
            })?,
            is_acknowledged: row.try_get("is_acknowledged")?,
            acknowledged_by: row.try_get("acknowledged_by")?,
            acknowledged_at: row.try_get("acknowledged_at")?,
            notifications_sent: row.try_get("notifications_sent")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vital_type_round_trips_through_wire_name() {
        for vt in [
            VitalType::BloodPressure,
            VitalType::HeartRate,
            VitalType::Temperature,
            VitalType::OxygenSaturation,
            VitalType::BloodSugar,
            VitalType::Weight,
        ] {
            assert_eq!(vt.as_str().parse::<VitalType>().unwrap(), vt);
        }
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AlertSeverity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn empty_submission_detected() {
        let new = NewVitalSigns {
            patient_id: Uuid::new_v4(),
            caregiver_id: Uuid::new_v4(),
            recorded_at: None,
            blood_pressure: None,
            heart_rate: None,
            temperature: None,
            oxygen_saturation: None,
            weight: None,
            blood_sugar: None,
            notes: Some("no readings taken".to_string()),
        };
        assert!(new.is_empty());
    }
}
