//! Postgres persistence for vitals, ranges, and alerts

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::engine::{alerted_field_names, default_ranges, evaluate_vitals, select_range, AlertDraft};
use crate::error::{VitalsError, VitalsResult};
use crate::models::{NewVitalSigns, VitalAlert, VitalRange, VitalSigns, VitalType};
use crate::trends::{build_trend, TimeRange, VitalsTrend};

#[derive(Clone)]
pub struct VitalsRepository {
    pool: PgPool,
}

impl VitalsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the range table, seeding the built-in defaults on first use
    pub async fn load_ranges(&self) -> VitalsResult<Vec<VitalRange>> {
        let ranges = self.list_ranges().await?;
        if !ranges.is_empty() {
            return Ok(ranges);
        }

        info!("vital range table empty, seeding defaults");
        for range in default_ranges() {
            self.seed_range(&range).await?;
        }
        self.list_ranges().await
    }

    /// Idempotent insert keyed on the unique range name, so two writers
    /// racing through an empty table cannot double-seed the defaults.
    async fn seed_range(&self, range: &VitalRange) -> VitalsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vital_ranges (
                id, name, age_min, age_max, gender,
                systolic_min, systolic_max, diastolic_min, diastolic_max,
                heart_rate_min, heart_rate_max, temperature_min, temperature_max,
                oxygen_saturation_min, oxygen_saturation_max,
                blood_sugar_min, blood_sugar_max, is_default, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(range.id)
        .bind(&range.name)
        .bind(range.age_min)
        .bind(range.age_max)
        .bind(&range.gender)
        .bind(range.systolic_min)
        .bind(range.systolic_max)
        .bind(range.diastolic_min)
        .bind(range.diastolic_max)
        .bind(range.heart_rate_min)
        .bind(range.heart_rate_max)
        .bind(range.temperature_min)
        .bind(range.temperature_max)
        .bind(range.oxygen_saturation_min)
        .bind(range.oxygen_saturation_max)
        .bind(range.blood_sugar_min)
        .bind(range.blood_sugar_max)
        .bind(range.is_default)
        .bind(range.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_ranges(&self) -> VitalsResult<Vec<VitalRange>> {
        let ranges = sqlx::query_as::<_, VitalRange>(
            "SELECT * FROM vital_ranges ORDER BY is_default DESC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ranges)
    }

    pub async fn create_range(&self, range: &VitalRange) -> VitalsResult<VitalRange> {
        let created = sqlx::query_as::<_, VitalRange>(
            r#"
            INSERT INTO vital_ranges (
                id, name, age_min, age_max, gender,
                systolic_min, systolic_max, diastolic_min, diastolic_max,
                heart_rate_min, heart_rate_max, temperature_min, temperature_max,
                oxygen_saturation_min, oxygen_saturation_max,
                blood_sugar_min, blood_sugar_max, is_default, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(range.id)
        .bind(&range.name)
        .bind(range.age_min)
        .bind(range.age_max)
        .bind(&range.gender)
        .bind(range.systolic_min)
        .bind(range.systolic_max)
        .bind(range.diastolic_min)
        .bind(range.diastolic_max)
        .bind(range.heart_rate_min)
        .bind(range.heart_rate_max)
        .bind(range.temperature_min)
        .bind(range.temperature_max)
        .bind(range.oxygen_saturation_min)
        .bind(range.oxygen_saturation_max)
        .bind(range.blood_sugar_min)
        .bind(range.blood_sugar_max)
        .bind(range.is_default)
        .bind(range.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Record a submission: evaluate thresholds, then persist the vitals
    /// row and any alerts in a single transaction. Returns the saved row,
    /// not the alerts.
    #[instrument(skip(self, input), fields(patient_id = %input.patient_id))]
    pub async fn record_vitals(&self, input: &NewVitalSigns) -> VitalsResult<VitalSigns> {
        if input.is_empty() {
            return Err(VitalsError::Validation(
                "at least one vital value must be recorded".to_string(),
            ));
        }

        let ranges = self.load_ranges().await?;
        let drafts = match select_range(&ranges) {
            Some(range) => evaluate_vitals(input, range),
            None => Vec::new(),
        };
        let alerted_values = alerted_field_names(&drafts);
        let is_alerted = !drafts.is_empty();
        if is_alerted {
            warn!(
                patient_id = %input.patient_id,
                alerted = ?alerted_values,
                "vital signs out of range"
            );
        }

        let mut tx = self.pool.begin().await?;

        let recorded_at = input.recorded_at.unwrap_or_else(Utc::now);
        let vitals = sqlx::query_as::<_, VitalSigns>(
            r#"
            INSERT INTO vital_signs (
                id, patient_id, caregiver_id, recorded_at,
                blood_pressure_systolic, blood_pressure_diastolic,
                heart_rate, temperature, oxygen_saturation, weight, blood_sugar,
                notes, is_alerted, alerted_values, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.patient_id)
        .bind(input.caregiver_id)
        .bind(recorded_at)
        .bind(input.blood_pressure.map(|bp| bp.systolic))
        .bind(input.blood_pressure.map(|bp| bp.diastolic))
        .bind(input.heart_rate)
        .bind(input.temperature)
        .bind(input.oxygen_saturation)
        .bind(input.weight)
        .bind(input.blood_sugar)
        .bind(&input.notes)
        .bind(is_alerted)
        .bind(&alerted_values)
        .fetch_one(&mut *tx)
        .await?;

        for draft in &drafts {
            insert_alert(&mut tx, &vitals, draft).await?;
        }

        tx.commit().await?;
        Ok(vitals)
    }

    pub async fn vitals_for_patient(
        &self,
        patient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> VitalsResult<Vec<VitalSigns>> {
        let rows = sqlx::query_as::<_, VitalSigns>(
            "SELECT * FROM vital_signs WHERE patient_id = $1 \
             ORDER BY recorded_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(patient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_vitals(&self, id: Uuid) -> VitalsResult<VitalSigns> {
        sqlx::query_as::<_, VitalSigns>("SELECT * FROM vital_signs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(VitalsError::RecordNotFound(id))
    }

    /// Rows in the lookback window, ascending by recording time
    pub async fn vitals_in_window(
        &self,
        patient_id: Uuid,
        time_range: TimeRange,
    ) -> VitalsResult<Vec<VitalSigns>> {
        let since = Utc::now() - time_range.duration();
        let rows = sqlx::query_as::<_, VitalSigns>(
            "SELECT * FROM vital_signs WHERE patient_id = $1 AND recorded_at >= $2 \
             ORDER BY recorded_at ASC",
        )
        .bind(patient_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn trends(
        &self,
        patient_id: Uuid,
        vital_type: VitalType,
        time_range: TimeRange,
    ) -> VitalsResult<VitalsTrend> {
        let records = self.vitals_in_window(patient_id, time_range).await?;
        Ok(build_trend(patient_id, vital_type, time_range, &records))
    }

    pub async fn list_alerts(
        &self,
        patient_id: Option<Uuid>,
        unacknowledged_only: bool,
        limit: i64,
        offset: i64,
    ) -> VitalsResult<Vec<VitalAlert>> {
        let mut sql = String::from("SELECT * FROM vital_alerts WHERE 1=1");
        if patient_id.is_some() {
            sql.push_str(" AND patient_id = $3");
        }
        if unacknowledged_only {
            sql.push_str(" AND is_acknowledged = FALSE");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT $1 OFFSET $2");

        let mut query = sqlx::query_as::<_, VitalAlert>(&sql).bind(limit).bind(offset);
        if let Some(patient_id) = patient_id {
            query = query.bind(patient_id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn acknowledge_alert(
        &self,
        alert_id: Uuid,
        acknowledged_by: Uuid,
    ) -> VitalsResult<VitalAlert> {
        sqlx::query_as::<_, VitalAlert>(
            "UPDATE vital_alerts \
             SET is_acknowledged = TRUE, acknowledged_by = $2, acknowledged_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(alert_id)
        .bind(acknowledged_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VitalsError::AlertNotFound(alert_id))
    }

    /// Append a delivery channel to an alert's notification log
    pub async fn mark_notification_sent(
        &self,
        alert_id: Uuid,
        channel: &str,
    ) -> VitalsResult<VitalAlert> {
        sqlx::query_as::<_, VitalAlert>(
            "UPDATE vital_alerts \
             SET notifications_sent = array_append(notifications_sent, $2) \
             WHERE id = $1 RETURNING *",
        )
        .bind(alert_id)
        .bind(channel)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(VitalsError::AlertNotFound(alert_id))
    }
}

async fn insert_alert(
    tx: &mut Transaction<'_, Postgres>,
    vitals: &VitalSigns,
    draft: &AlertDraft,
) -> VitalsResult<()> {
    sqlx::query(
        r#"
        INSERT INTO vital_alerts (
            id, patient_id, vital_signs_id, caregiver_id, vital_type,
            actual_value, expected_range, severity,
            is_acknowledged, notifications_sent, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, '{}', NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(vitals.patient_id)
    .bind(vitals.id)
    .bind(vitals.caregiver_id)
    .bind(draft.vital_type.as_str())
    .bind(draft.actual_value.to_string())
    .bind(draft.expected_range.to_string())
    .bind(draft.severity.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
