//! Centralized audit logging service
//!
//! Replaces ad-hoc audit logging code across handlers so every entity
//! mutation leaves a consistent trail.

use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthContext;

/// Centralized audit logging service
///
/// Provides methods to log audit events for the platform's entity types,
/// automatically capturing the acting user from the auth context.
#[derive(Clone)]
pub struct AuditService {
    db_pool: PgPool,
}

impl AuditService {
    /// Create a new audit service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Log an audit action for any entity type
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// audit_service.log_action(
    ///     &auth,
    ///     "vital_signs",
    ///     vitals_id,
    ///     "create",
    ///     Some(serde_json::json!({"alerted": true})),
    /// ).await?;
    /// ```
    pub async fn log_action(
        &self,
        auth: &AuthContext,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        details: Option<JsonValue>,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, entity_type, entity_id, user_id, action, action_details, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entity_type)
        .bind(entity_id)
        .bind(auth.user_id)
        .bind(action)
        .bind(details)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to log audit event: {}", e)))?;

        Ok(())
    }

    /// Log a vitals audit action
    pub async fn log_vitals_action(
        &self,
        auth: &AuthContext,
        vitals_id: Uuid,
        action: &str,
        details: Option<JsonValue>,
    ) -> Result<(), ApiError> {
        self.log_action(auth, "vital_signs", vitals_id, action, details)
            .await
    }

    /// Log a patient audit action
    pub async fn log_patient_action(
        &self,
        auth: &AuthContext,
        patient_id: Uuid,
        action: &str,
        details: Option<JsonValue>,
    ) -> Result<(), ApiError> {
        self.log_action(auth, "patient", patient_id, action, details)
            .await
    }

    /// Log a service catalog audit action
    pub async fn log_catalog_action(
        &self,
        auth: &AuthContext,
        entity_id: Uuid,
        action: &str,
        details: Option<JsonValue>,
    ) -> Result<(), ApiError> {
        self.log_action(auth, "care_service", entity_id, action, details)
            .await
    }

    /// Log a visit audit action
    pub async fn log_visit_action(
        &self,
        auth: &AuthContext,
        visit_id: Uuid,
        action: &str,
        details: Option<JsonValue>,
    ) -> Result<(), ApiError> {
        self.log_action(auth, "visit", visit_id, action, details)
            .await
    }
}
