//! Request payload validation tests
//!
//! Exercises the validation layer the way a client would hit it: payloads
//! deserialized from JSON, then run through `RequestValidation`.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use homecare_server::handlers::notifications::CreateNotificationRequest;
use homecare_server::handlers::patients::{CreatePatientRequest, ReviewPatientRequest};
use homecare_server::handlers::pricing::{CreateServiceRequest, UpdateItemRequest};
use homecare_server::handlers::visits::{CancelVisitRequest, CreateVisitRequest};
use homecare_server::validation::RequestValidation;

#[test]
fn create_service_rejects_negative_price() {
    let request: CreateServiceRequest = serde_json::from_value(json!({
        "name": "Basic Home Care",
        "basePriceDaily": "-10.00"
    }))
    .unwrap();
    assert!(request.validate().is_err());
}

#[test]
fn create_service_accepts_decimal_string_prices() {
    let request: CreateServiceRequest = serde_json::from_value(json!({
        "name": "Basic Home Care",
        "description": "Daily assistance",
        "basePriceDaily": "120.50"
    }))
    .unwrap();
    assert!(request.validate().is_ok());
}

#[test]
fn update_item_distinguishes_null_parent_from_omitted() {
    let explicit_null: UpdateItemRequest =
        serde_json::from_value(json!({ "parentId": null })).unwrap();
    assert_eq!(explicit_null.parent_id, Some(None));

    let omitted: UpdateItemRequest = serde_json::from_value(json!({})).unwrap();
    assert_eq!(omitted.parent_id, None);

    let set: UpdateItemRequest = serde_json::from_value(json!({
        "parentId": "8f5c3f1e-33a1-4e26-bb34-7c36cf2aa111"
    }))
    .unwrap();
    assert!(matches!(set.parent_id, Some(Some(_))));
}

#[test]
fn patient_application_rejects_future_birth_date() {
    let request = CreatePatientRequest {
        full_name: "Maria Jensen".to_string(),
        date_of_birth: (Utc::now() + Duration::days(2)).date_naive(),
        gender: "female".to_string(),
        address: None,
        phone: None,
        emergency_contact: None,
        care_level: None,
        medical_notes: None,
    };
    assert!(request.validate().is_err());
}

#[test]
fn rejection_requires_a_reason() {
    let without_reason = ReviewPatientRequest {
        status: "rejected".to_string(),
        rejection_reason: None,
    };
    assert!(without_reason.validate().is_err());

    let with_reason = ReviewPatientRequest {
        status: "rejected".to_string(),
        rejection_reason: Some("Outside the service area".to_string()),
    };
    assert!(with_reason.validate().is_ok());
}

#[test]
fn approval_needs_no_reason() {
    let request = ReviewPatientRequest {
        status: "approved".to_string(),
        rejection_reason: None,
    };
    assert!(request.validate().is_ok());
}

#[test]
fn visit_end_must_follow_start() {
    let start = Utc::now();
    let request = CreateVisitRequest {
        patient_id: Uuid::new_v4(),
        service_request_id: None,
        caregiver_id: Uuid::new_v4(),
        scheduled_start: start,
        scheduled_end: start - Duration::hours(1),
        visit_notes: None,
    };
    assert!(request.validate().is_err());
}

#[test]
fn cancel_visit_rejects_blank_reason() {
    let request = CancelVisitRequest {
        reason: "   ".to_string(),
    };
    assert!(request.validate().is_err());
}

#[test]
fn notification_payload_round_trips_camel_case() {
    let request: CreateNotificationRequest = serde_json::from_value(json!({
        "recipientId": "8f5c3f1e-33a1-4e26-bb34-7c36cf2aa111",
        "notificationType": "visit_reminder",
        "title": "Upcoming visit",
        "message": "Visit scheduled for tomorrow at 09:00"
    }))
    .unwrap();
    assert!(request.validate().is_ok());
    assert_eq!(request.notification_type, "visit_reminder");
}
