//! Rolling trend computation over a patient's vitals history
//!
//! Points are projected from stored vitals rows, averaged, and classified
//! with a two-halves comparison. Any alerted point in the window forces the
//! `concerning` label regardless of the numeric change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{VitalSigns, VitalType};

/// Lookback window for a trend query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
}

impl TimeRange {
    pub fn duration(self) -> Duration {
        match self {
            TimeRange::Day => Duration::hours(24),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
            TimeRange::Quarter => Duration::days(90),
            TimeRange::Year => Duration::days(365),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Quarter => "90d",
            TimeRange::Year => "1y",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range: {0}")]
pub struct ParseTimeRangeError(pub String);

impl FromStr for TimeRange {
    type Err = ParseTimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(TimeRange::Day),
            "7d" => Ok(TimeRange::Week),
            "30d" => Ok(TimeRange::Month),
            "90d" => Ok(TimeRange::Quarter),
            "1y" => Ok(TimeRange::Year),
            other => Err(ParseTimeRangeError(other.to_string())),
        }
    }
}

/// One plotted reading within the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
    /// Present only for blood pressure points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
    pub is_alert: bool,
}

/// Qualitative direction label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
    Concerning,
}

/// Window average; blood pressure keeps its two components separate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TrendAverage {
    Single(f64),
    #[serde(rename_all = "camelCase")]
    BloodPressure { systolic: f64, diastolic: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalsTrend {
    pub patient_id: Uuid,
    pub vital_type: VitalType,
    pub time_range: TimeRange,
    pub data_points: Vec<TrendPoint>,
    pub average_value: TrendAverage,
    pub trend: TrendDirection,
    pub generated_at: DateTime<Utc>,
}

/// Project stored rows (already filtered to the window, ascending by
/// `recorded_at`) to trend points. Rows missing the requested field are
/// dropped, not zero-filled.
pub fn extract_points(records: &[VitalSigns], vital_type: VitalType) -> Vec<TrendPoint> {
    records
        .iter()
        .filter_map(|record| {
            let is_alert = record
                .alerted_values
                .iter()
                .any(|v| v == vital_type.as_str());
            let (value, diastolic) = match vital_type {
                VitalType::BloodPressure => {
                    let bp = record.blood_pressure?;
                    (f64::from(bp.systolic), Some(f64::from(bp.diastolic)))
                }
                VitalType::HeartRate => (f64::from(record.heart_rate?), None),
                VitalType::Temperature => (record.temperature?, None),
                VitalType::OxygenSaturation => {
                    (f64::from(record.oxygen_saturation?), None)
                }
                VitalType::BloodSugar => (record.blood_sugar?, None),
                VitalType::Weight => (record.weight?, None),
            };
            Some(TrendPoint {
                date: record.recorded_at,
                value,
                diastolic,
                is_alert,
            })
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Average over the window, rounded to one decimal place
pub fn average(points: &[TrendPoint], vital_type: VitalType) -> TrendAverage {
    let round1 = |v: f64| (v * 10.0).round() / 10.0;
    match vital_type {
        VitalType::BloodPressure => TrendAverage::BloodPressure {
            systolic: round1(mean(points.iter().map(|p| p.value))),
            diastolic: round1(mean(
                points.iter().filter_map(|p| p.diastolic),
            )),
        },
        _ => TrendAverage::Single(round1(mean(points.iter().map(|p| p.value)))),
    }
}

/// Classify the direction with a two-halves comparison.
///
/// The alert override runs first; after that fewer than 4 points is always
/// `stable`. Percent change below 5% is `stable`, then per-type direction
/// rules apply. Blood pressure compares systolic averages.
pub fn classify(points: &[TrendPoint], vital_type: VitalType) -> TrendDirection {
    if points.iter().any(|p| p.is_alert) {
        return TrendDirection::Concerning;
    }
    if points.len() < 4 {
        return TrendDirection::Stable;
    }

    let mid = points.len() / 2;
    let first = mean(points[..mid].iter().map(|p| p.value));
    let second = mean(points[mid..].iter().map(|p| p.value));
    if first == 0.0 {
        return TrendDirection::Stable;
    }
    let change = (second - first) / first * 100.0;
    if change.abs() < 5.0 {
        return TrendDirection::Stable;
    }

    match vital_type {
        // Lower readings are better.
        VitalType::BloodPressure | VitalType::Temperature => {
            if change < 0.0 {
                TrendDirection::Improving
            } else {
                TrendDirection::Declining
            }
        }
        // Higher readings are better.
        VitalType::OxygenSaturation => {
            if change > 0.0 {
                TrendDirection::Improving
            } else {
                TrendDirection::Declining
            }
        }
        // Either direction is fine while the move stays bounded.
        VitalType::HeartRate | VitalType::BloodSugar | VitalType::Weight => {
            if change.abs() <= 10.0 {
                TrendDirection::Improving
            } else {
                TrendDirection::Declining
            }
        }
    }
}

/// Assemble the full trend summary for pre-filtered, ascending records
pub fn build_trend(
    patient_id: Uuid,
    vital_type: VitalType,
    time_range: TimeRange,
    records: &[VitalSigns],
) -> VitalsTrend {
    let data_points = extract_points(records, vital_type);
    let average_value = average(&data_points, vital_type);
    let trend = classify(&data_points, vital_type);
    VitalsTrend {
        patient_id,
        vital_type,
        time_range,
        data_points,
        average_value,
        trend,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BloodPressure;

    fn point(value: f64, is_alert: bool) -> TrendPoint {
        TrendPoint {
            date: Utc::now(),
            value,
            diastolic: None,
            is_alert,
        }
    }

    fn points(values: &[f64]) -> Vec<TrendPoint> {
        values.iter().map(|&v| point(v, false)).collect()
    }

    fn record(recorded_at: DateTime<Utc>) -> VitalSigns {
        VitalSigns {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            caregiver_id: Uuid::new_v4(),
            recorded_at,
            blood_pressure: None,
            heart_rate: None,
            temperature: None,
            oxygen_saturation: None,
            weight: None,
            blood_sugar: None,
            notes: None,
            is_alerted: false,
            alerted_values: Vec::new(),
            created_at: recorded_at,
            updated_at: recorded_at,
        }
    }

    #[test]
    fn time_range_parses_and_prints() {
        for raw in ["24h", "7d", "30d", "90d", "1y"] {
            let range: TimeRange = raw.parse().unwrap();
            assert_eq!(range.to_string(), raw);
        }
        assert!("2w".parse::<TimeRange>().is_err());
    }

    #[test]
    fn fewer_than_four_points_is_stable() {
        assert_eq!(
            classify(&points(&[100.0, 200.0, 300.0]), VitalType::HeartRate),
            TrendDirection::Stable
        );
        assert_eq!(classify(&[], VitalType::HeartRate), TrendDirection::Stable);
    }

    #[test]
    fn alert_override_beats_everything() {
        // Systolic dropping sharply would read as improving, but an
        // alerted point in the window forces concerning.
        let mut pts = points(&[180.0, 175.0, 130.0, 125.0]);
        pts[0].is_alert = true;
        assert_eq!(
            classify(&pts, VitalType::BloodPressure),
            TrendDirection::Concerning
        );

        // Override also applies below the 4-point floor.
        let mut few = points(&[120.0, 118.0]);
        few[1].is_alert = true;
        assert_eq!(
            classify(&few, VitalType::BloodPressure),
            TrendDirection::Concerning
        );
    }

    #[test]
    fn small_change_is_stable() {
        assert_eq!(
            classify(&points(&[100.0, 100.0, 104.0, 104.0]), VitalType::HeartRate),
            TrendDirection::Stable
        );
    }

    #[test]
    fn blood_pressure_improves_on_decrease() {
        assert_eq!(
            classify(
                &points(&[150.0, 150.0, 130.0, 130.0]),
                VitalType::BloodPressure
            ),
            TrendDirection::Improving
        );
        assert_eq!(
            classify(
                &points(&[130.0, 130.0, 150.0, 150.0]),
                VitalType::BloodPressure
            ),
            TrendDirection::Declining
        );
    }

    #[test]
    fn oxygen_saturation_improves_on_increase() {
        assert_eq!(
            classify(
                &points(&[90.0, 90.0, 96.0, 96.0]),
                VitalType::OxygenSaturation
            ),
            TrendDirection::Improving
        );
        assert_eq!(
            classify(
                &points(&[96.0, 96.0, 90.0, 90.0]),
                VitalType::OxygenSaturation
            ),
            TrendDirection::Declining
        );
    }

    #[test]
    fn heart_rate_bounded_move_is_improving() {
        // 8% up: past the stable band, inside the bounded band.
        assert_eq!(
            classify(&points(&[100.0, 100.0, 108.0, 108.0]), VitalType::HeartRate),
            TrendDirection::Improving
        );
        // 20% up is a genuine decline.
        assert_eq!(
            classify(&points(&[100.0, 100.0, 120.0, 120.0]), VitalType::HeartRate),
            TrendDirection::Declining
        );
    }

    #[test]
    fn zero_first_half_average_is_stable() {
        assert_eq!(
            classify(&points(&[0.0, 0.0, 50.0, 50.0]), VitalType::HeartRate),
            TrendDirection::Stable
        );
    }

    #[test]
    fn extract_drops_records_missing_the_field() {
        let now = Utc::now();
        let mut with_hr = record(now);
        with_hr.heart_rate = Some(72);
        let without_hr = record(now);

        let pts = extract_points(&[with_hr, without_hr], VitalType::HeartRate);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].value, 72.0);
    }

    #[test]
    fn extract_marks_alerted_points_per_field() {
        let now = Utc::now();
        let mut rec = record(now);
        rec.heart_rate = Some(155);
        rec.temperature = Some(36.8);
        rec.is_alerted = true;
        rec.alerted_values = vec!["heartRate".to_string()];

        let hr = extract_points(std::slice::from_ref(&rec), VitalType::HeartRate);
        assert!(hr[0].is_alert);
        let temp = extract_points(std::slice::from_ref(&rec), VitalType::Temperature);
        assert!(!temp[0].is_alert);
    }

    #[test]
    fn blood_pressure_points_carry_diastolic() {
        let now = Utc::now();
        let mut rec = record(now);
        rec.blood_pressure = Some(BloodPressure {
            systolic: 120,
            diastolic: 80,
        });
        let pts = extract_points(std::slice::from_ref(&rec), VitalType::BloodPressure);
        assert_eq!(pts[0].value, 120.0);
        assert_eq!(pts[0].diastolic, Some(80.0));
    }

    #[test]
    fn blood_pressure_average_keeps_components_separate() {
        let pts = vec![
            TrendPoint {
                date: Utc::now(),
                value: 120.0,
                diastolic: Some(80.0),
                is_alert: false,
            },
            TrendPoint {
                date: Utc::now(),
                value: 130.0,
                diastolic: Some(86.0),
                is_alert: false,
            },
        ];
        assert_eq!(
            average(&pts, VitalType::BloodPressure),
            TrendAverage::BloodPressure {
                systolic: 125.0,
                diastolic: 83.0
            }
        );
    }

    #[test]
    fn single_average_rounds_to_one_decimal() {
        let pts = points(&[72.0, 73.0, 73.0]);
        assert_eq!(
            average(&pts, VitalType::HeartRate),
            TrendAverage::Single(72.7)
        );
    }

    #[test]
    fn build_trend_assembles_summary() {
        let now = Utc::now();
        let patient_id = Uuid::new_v4();
        let records: Vec<VitalSigns> = [98, 97, 98, 98]
            .iter()
            .enumerate()
            .map(|(i, &spo2)| {
                let mut rec = record(now - Duration::hours(24 - i as i64));
                rec.patient_id = patient_id;
                rec.oxygen_saturation = Some(spo2);
                rec
            })
            .collect();

        let trend = build_trend(
            patient_id,
            VitalType::OxygenSaturation,
            TimeRange::Day,
            &records,
        );
        assert_eq!(trend.data_points.len(), 4);
        assert_eq!(trend.trend, TrendDirection::Stable);
        assert_eq!(trend.average_value, TrendAverage::Single(97.8));
    }

    #[test]
    fn trend_serializes_in_wire_format() {
        let trend = build_trend(Uuid::new_v4(), VitalType::HeartRate, TimeRange::Week, &[]);
        let value = serde_json::to_value(&trend).unwrap();
        assert_eq!(value["vitalType"], "heartRate");
        assert_eq!(value["timeRange"], "7d");
        assert_eq!(value["trend"], "stable");
        assert_eq!(value["averageValue"], 0.0);
    }
}
