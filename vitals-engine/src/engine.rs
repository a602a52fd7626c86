//! Threshold evaluation for newly recorded vital signs
//!
//! A stateless, single-pass evaluation: each submitted vital is compared
//! against the selected normal range and classified into a severity tier.
//! Fields missing from the submission or without bounds in the range table
//! are skipped entirely.

use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{AlertSeverity, NewVitalSigns, VitalRange, VitalType};

/// An alert the engine wants persisted alongside the vitals row
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub vital_type: VitalType,
    /// JSON-encoded actual value (object for compound types)
    pub actual_value: serde_json::Value,
    /// JSON-encoded expected-range bounds
    pub expected_range: serde_json::Value,
    pub severity: AlertSeverity,
}

/// Built-in ranges seeded when the reference table is empty
pub fn default_ranges() -> Vec<VitalRange> {
    let now = chrono::Utc::now();
    vec![
        VitalRange {
            id: Uuid::new_v4(),
            name: "Adult Default".to_string(),
            age_min: Some(18),
            age_max: Some(65),
            gender: "all".to_string(),
            systolic_min: Some(90),
            systolic_max: Some(140),
            diastolic_min: Some(60),
            diastolic_max: Some(90),
            heart_rate_min: Some(60),
            heart_rate_max: Some(100),
            temperature_min: Some(36.1),
            temperature_max: Some(37.2),
            oxygen_saturation_min: Some(95),
            oxygen_saturation_max: Some(100),
            blood_sugar_min: Some(70.0),
            blood_sugar_max: Some(140.0),
            is_default: true,
            created_at: now,
        },
        VitalRange {
            id: Uuid::new_v4(),
            name: "Senior Default".to_string(),
            age_min: Some(65),
            age_max: None,
            gender: "all".to_string(),
            systolic_min: Some(90),
            systolic_max: Some(150),
            diastolic_min: Some(60),
            diastolic_max: Some(90),
            heart_rate_min: Some(60),
            heart_rate_max: Some(100),
            temperature_min: Some(36.0),
            temperature_max: Some(37.2),
            oxygen_saturation_min: Some(93),
            oxygen_saturation_max: Some(100),
            blood_sugar_min: Some(70.0),
            blood_sugar_max: Some(160.0),
            is_default: false,
            created_at: now,
        },
    ]
}

/// Pick the range all evaluations use: the first entry flagged as default,
/// else the first entry. Patient age/gender is intentionally not consulted.
pub fn select_range(ranges: &[VitalRange]) -> Option<&VitalRange> {
    let selected = ranges.iter().find(|r| r.is_default).or_else(|| ranges.first());
    match selected {
        Some(range) => debug!(range = %range.name, "selected vital range"),
        None => warn!("no vital ranges configured, alerting disabled for this submission"),
    }
    selected
}

/// Evaluate a submission against the selected range.
///
/// Returns one draft per out-of-range vital, in a fixed field order
/// (blood pressure, heart rate, temperature, oxygen saturation, blood
/// sugar). Weight carries no range bounds and never alerts.
pub fn evaluate_vitals(input: &NewVitalSigns, range: &VitalRange) -> Vec<AlertDraft> {
    let mut drafts = Vec::new();

    if let Some(bp) = input.blood_pressure {
        if let (Some(s_min), Some(s_max), Some(d_min), Some(d_max)) = (
            range.systolic_min,
            range.systolic_max,
            range.diastolic_min,
            range.diastolic_max,
        ) {
            let out_of_range = bp.systolic < s_min
                || bp.systolic > s_max
                || bp.diastolic < d_min
                || bp.diastolic > d_max;
            if out_of_range {
                let severity = if bp.systolic > 180 || bp.diastolic > 120 {
                    AlertSeverity::Critical
                } else if bp.systolic > 160 || bp.diastolic > 100 {
                    AlertSeverity::High
                } else if bp.systolic < 90 || bp.diastolic < 60 {
                    AlertSeverity::Medium
                } else {
                    AlertSeverity::Low
                };
                drafts.push(AlertDraft {
                    vital_type: VitalType::BloodPressure,
                    actual_value: json!({
                        "systolic": bp.systolic,
                        "diastolic": bp.diastolic,
                    }),
                    expected_range: json!({
                        "systolic": { "min": s_min, "max": s_max },
                        "diastolic": { "min": d_min, "max": d_max },
                    }),
                    severity,
                });
            }
        }
    }

    if let Some(hr) = input.heart_rate {
        if let (Some(min), Some(max)) = (range.heart_rate_min, range.heart_rate_max) {
            if hr < min || hr > max {
                let severity = if hr < 40 || hr > 150 {
                    AlertSeverity::Critical
                } else if hr < 50 || hr > 120 {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                };
                drafts.push(AlertDraft {
                    vital_type: VitalType::HeartRate,
                    actual_value: json!(hr),
                    expected_range: json!({ "min": min, "max": max }),
                    severity,
                });
            }
        }
    }

    if let Some(temp) = input.temperature {
        if let (Some(min), Some(max)) = (range.temperature_min, range.temperature_max) {
            if temp < min || temp > max {
                let severity = if temp > 39.0 || temp < 35.0 {
                    AlertSeverity::Critical
                } else if temp > 38.5 || temp < 35.5 {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                };
                drafts.push(AlertDraft {
                    vital_type: VitalType::Temperature,
                    actual_value: json!(temp),
                    expected_range: json!({ "min": min, "max": max }),
                    severity,
                });
            }
        }
    }

    // Oxygen saturation only alerts on a lower-bound violation.
    if let Some(spo2) = input.oxygen_saturation {
        if let Some(min) = range.oxygen_saturation_min {
            if spo2 < min {
                let severity = if spo2 < 88 {
                    AlertSeverity::Critical
                } else if spo2 < 92 {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                };
                drafts.push(AlertDraft {
                    vital_type: VitalType::OxygenSaturation,
                    actual_value: json!(spo2),
                    expected_range: json!({
                        "min": min,
                        "max": range.oxygen_saturation_max,
                    }),
                    severity,
                });
            }
        }
    }

    if let Some(sugar) = input.blood_sugar {
        if let (Some(min), Some(max)) = (range.blood_sugar_min, range.blood_sugar_max) {
            if sugar < min || sugar > max {
                let severity = if sugar > 300.0 || sugar < 50.0 {
                    AlertSeverity::Critical
                } else if sugar > 250.0 || sugar < 60.0 {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                };
                drafts.push(AlertDraft {
                    vital_type: VitalType::BloodSugar,
                    actual_value: json!(sugar),
                    expected_range: json!({ "min": min, "max": max }),
                    severity,
                });
            }
        }
    }

    drafts
}

/// Field names for the `alerted_values` column of the vitals row
pub fn alerted_field_names(drafts: &[AlertDraft]) -> Vec<String> {
    drafts.iter().map(|d| d.vital_type.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BloodPressure;

    fn adult_range() -> VitalRange {
        default_ranges().into_iter().next().unwrap()
    }

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

    fn single(drafts: Vec<AlertDraft>) -> AlertDraft {
        assert_eq!(drafts.len(), 1, "expected exactly one alert: {drafts:?}");
        drafts.into_iter().next().unwrap()
    }

    #[test]
    fn in_range_vitals_produce_no_alerts() {
        let mut input = submission();
        input.blood_pressure = Some(BloodPressure { systolic: 120, diastolic: 80 });
        input.heart_rate = Some(72);
        input.temperature = Some(36.8);
        input.oxygen_saturation = Some(98);
        input.blood_sugar = Some(95.0);
        assert!(evaluate_vitals(&input, &adult_range()).is_empty());
    }

    #[test]
    fn spo2_99_is_within_range() {
        let mut input = submission();
        input.oxygen_saturation = Some(99);
        assert!(evaluate_vitals(&input, &adult_range()).is_empty());
    }

    #[test]
    fn heart_rate_155_is_critical() {
        let mut input = submission();
        input.heart_rate = Some(155);
        let draft = single(evaluate_vitals(&input, &adult_range()));
        assert_eq!(draft.vital_type, VitalType::HeartRate);
        assert_eq!(draft.severity, AlertSeverity::Critical);
        assert_eq!(draft.actual_value, serde_json::json!(155));
    }

    #[test]
    fn heart_rate_40_is_not_critical() {
        // 40 is out of the 60-100 range but not < 40, so it lands on the
        // high tier (40 < 50).
        let mut input = submission();
        input.heart_rate = Some(40);
        let draft = single(evaluate_vitals(&input, &adult_range()));
        assert_eq!(draft.severity, AlertSeverity::High);
    }

    #[test]
    fn heart_rate_39_is_critical() {
        let mut input = submission();
        input.heart_rate = Some(39);
        let draft = single(evaluate_vitals(&input, &adult_range()));
        assert_eq!(draft.severity, AlertSeverity::Critical);
    }

    #[test]
    fn heart_rate_150_is_high_151_is_critical() {
        let mut input = submission();
        input.heart_rate = Some(150);
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::High
        );
        input.heart_rate = Some(151);
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::Critical
        );
    }

    #[test]
    fn heart_rate_110_is_medium() {
        let mut input = submission();
        input.heart_rate = Some(110);
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::Medium
        );
    }

    #[test]
    fn systolic_180_is_high_181_is_critical() {
        let mut input = submission();
        input.blood_pressure = Some(BloodPressure { systolic: 180, diastolic: 80 });
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::High
        );
        input.blood_pressure = Some(BloodPressure { systolic: 181, diastolic: 80 });
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::Critical
        );
    }

    #[test]
    fn diastolic_121_is_critical() {
        let mut input = submission();
        input.blood_pressure = Some(BloodPressure { systolic: 130, diastolic: 121 });
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::Critical
        );
    }

    #[test]
    fn low_blood_pressure_is_medium() {
        let mut input = submission();
        input.blood_pressure = Some(BloodPressure { systolic: 85, diastolic: 55 });
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::Medium
        );
    }

    #[test]
    fn mildly_elevated_blood_pressure_is_low() {
        // 145/85: outside 90-140 systolic bounds, but below every
        // escalation threshold.
        let mut input = submission();
        input.blood_pressure = Some(BloodPressure { systolic: 145, diastolic: 85 });
        assert_eq!(
            single(evaluate_vitals(&input, &adult_range())).severity,
            AlertSeverity::Low
        );
    }

    #[test]
    fn blood_pressure_alert_encodes_compound_values() {
        let mut input = submission();
        input.blood_pressure = Some(BloodPressure { systolic: 185, diastolic: 95 });
        let draft = single(evaluate_vitals(&input, &adult_range()));
        assert_eq!(
            draft.actual_value,
            serde_json::json!({ "systolic": 185, "diastolic": 95 })
        );
        assert_eq!(
            draft.expected_range,
            serde_json::json!({
                "systolic": { "min": 90, "max": 140 },
                "diastolic": { "min": 60, "max": 90 },
            })
        );
    }

    #[test]
    fn temperature_tiers() {
        let mut input = submission();
        for (temp, severity) in [
            (39.1, AlertSeverity::Critical),
            (34.9, AlertSeverity::Critical),
            (38.6, AlertSeverity::High),
            (35.4, AlertSeverity::High),
            (37.8, AlertSeverity::Medium),
        ] {
            input.temperature = Some(temp);
            assert_eq!(
                single(evaluate_vitals(&input, &adult_range())).severity,
                severity,
                "temperature {temp}"
            );
        }
    }

    #[test]
    fn spo2_only_alerts_below_the_minimum() {
        let mut input = submission();
        // Above the max is not an alert for SpO2.
        input.oxygen_saturation = Some(100);
        assert!(evaluate_vitals(&input, &adult_range()).is_empty());

        for (spo2, severity) in [
            (94, AlertSeverity::Medium),
            (91, AlertSeverity::High),
            (87, AlertSeverity::Critical),
        ] {
            input.oxygen_saturation = Some(spo2);
            assert_eq!(
                single(evaluate_vitals(&input, &adult_range())).severity,
                severity,
                "spo2 {spo2}"
            );
        }
    }

    #[test]
    fn blood_sugar_tiers() {
        let mut input = submission();
        for (sugar, severity) in [
            (301.0, AlertSeverity::Critical),
            (49.0, AlertSeverity::Critical),
            (260.0, AlertSeverity::High),
            (55.0, AlertSeverity::High),
            (150.0, AlertSeverity::Medium),
        ] {
            input.blood_sugar = Some(sugar);
            assert_eq!(
                single(evaluate_vitals(&input, &adult_range())).severity,
                severity,
                "blood sugar {sugar}"
            );
        }
    }

    #[test]
    fn missing_range_bounds_skip_the_field() {
        let mut range = adult_range();
        range.heart_rate_min = None;
        range.heart_rate_max = None;
        let mut input = submission();
        input.heart_rate = Some(200);
        assert!(evaluate_vitals(&input, &range).is_empty());
    }

    #[test]
    fn weight_never_alerts() {
        let mut input = submission();
        input.weight = Some(250.0);
        assert!(evaluate_vitals(&input, &adult_range()).is_empty());
    }

    #[test]
    fn multiple_out_of_range_fields_yield_one_alert_each() {
        let mut input = submission();
        input.heart_rate = Some(130);
        input.blood_sugar = Some(280.0);
        let drafts = evaluate_vitals(&input, &adult_range());
        assert_eq!(drafts.len(), 2);
        assert_eq!(
            alerted_field_names(&drafts),
            vec!["heartRate".to_string(), "bloodSugar".to_string()]
        );
    }

    #[test]
    fn select_range_prefers_default_then_first() {
        let ranges = default_ranges();
        assert_eq!(select_range(&ranges).unwrap().name, "Adult Default");

        let mut no_default = ranges.clone();
        for r in &mut no_default {
            r.is_default = false;
        }
        assert_eq!(select_range(&no_default).unwrap().name, "Adult Default");

        // Default wins even when it is not first.
        let mut senior_default = ranges;
        senior_default[0].is_default = false;
        senior_default[1].is_default = true;
        assert_eq!(select_range(&senior_default).unwrap().name, "Senior Default");

        assert!(select_range(&[]).is_none());
    }

    // Seeding upserts on the unique range name, so the built-ins must not
    // collide with each other.
    #[test]
    fn default_range_names_are_distinct() {
        let ranges = default_ranges();
        let mut names: Vec<_> = ranges.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ranges.len());
    }
}
