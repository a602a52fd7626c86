use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{
    handlers::{
        health, medications, notifications, patients, pricing, service_requests, visits, vitals,
    },
    openapi,
    server::HomeCareServer,
};

/// Create health check routes
pub fn health_routes() -> Router<HomeCareServer> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/version", get(health::version_info))
        .route("/status", get(health::system_status))
}

/// Create service catalog and pricing routes
pub fn pricing_routes() -> Router<HomeCareServer> {
    Router::new()
        .route("/pricing/services", get(pricing::list_services))
        .route("/pricing/services", post(pricing::create_service))
        .route("/pricing/services/:service_id", get(pricing::get_service))
        .route("/pricing/services/:service_id", put(pricing::update_service))
        .route(
            "/pricing/services/:service_id",
            delete(pricing::deactivate_service),
        )
        .route(
            "/pricing/services/:service_id/hierarchy",
            get(pricing::get_service_hierarchy),
        )
        .route(
            "/pricing/services/:service_id/items",
            get(pricing::list_items),
        )
        .route(
            "/pricing/services/:service_id/items",
            post(pricing::create_item),
        )
        .route(
            "/pricing/services/:service_id/items/:item_id",
            put(pricing::update_item),
        )
        .route(
            "/pricing/services/:service_id/items/:item_id",
            delete(pricing::delete_item),
        )
}

/// Create vital signs monitoring routes
pub fn vitals_routes() -> Router<HomeCareServer> {
    Router::new()
        .route("/vitals", post(vitals::record_vitals))
        .route("/vitals", get(vitals::list_vitals))
        .route("/vitals/trends", get(vitals::get_trends))
        .route("/vitals/ranges", get(vitals::list_ranges))
        .route("/vitals/ranges", post(vitals::create_range))
        .route("/vitals/alerts", get(vitals::list_alerts))
        .route(
            "/vitals/alerts/:alert_id/acknowledge",
            post(vitals::acknowledge_alert),
        )
        .route("/vitals/:vitals_id", get(vitals::get_vitals))
}

/// Create patient intake and management routes
pub fn patient_routes() -> Router<HomeCareServer> {
    Router::new()
        .route("/patients", get(patients::list_patients))
        .route("/patients", post(patients::create_patient))
        .route("/patients/:patient_id", get(patients::get_patient))
        .route("/patients/:patient_id", put(patients::update_patient))
        .route("/patients/:patient_id/review", post(patients::review_patient))
}

/// Create service request routes
pub fn service_request_routes() -> Router<HomeCareServer> {
    Router::new()
        .route(
            "/service-requests",
            get(service_requests::list_service_requests),
        )
        .route(
            "/service-requests",
            post(service_requests::create_service_request),
        )
        .route(
            "/service-requests/:request_id",
            get(service_requests::get_service_request),
        )
        .route(
            "/service-requests/:request_id",
            put(service_requests::update_service_request),
        )
}

/// Create visit scheduling routes
pub fn visit_routes() -> Router<HomeCareServer> {
    Router::new()
        .route("/visits", get(visits::list_visits))
        .route("/visits", post(visits::create_visit))
        .route("/visits/:visit_id", get(visits::get_visit))
        .route("/visits/:visit_id", put(visits::update_visit))
        .route("/visits/:visit_id/cancel", post(visits::cancel_visit))
}

/// Create notification routes
pub fn notification_routes() -> Router<HomeCareServer> {
    Router::new()
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications", post(notifications::create_notification))
        .route(
            "/notifications/mark-read",
            post(notifications::bulk_mark_read),
        )
        .route(
            "/notifications/:notification_id/read",
            post(notifications::mark_notification_read),
        )
        .route(
            "/notifications/:notification_id",
            delete(notifications::delete_notification),
        )
}

/// Create medication tracking routes
pub fn medication_routes() -> Router<HomeCareServer> {
    Router::new()
        .route("/medications", get(medications::list_medications))
        .route("/medications", post(medications::create_medication))
        .route(
            "/medications/:medication_id",
            get(medications::get_medication),
        )
        .route(
            "/medications/:medication_id",
            put(medications::update_medication),
        )
        .route(
            "/medications/:medication_id/administrations",
            get(medications::list_administrations),
        )
        .route(
            "/medications/:medication_id/administrations",
            post(medications::record_administration),
        )
}

/// Create API v1 routes
pub fn api_v1_routes() -> Router<HomeCareServer> {
    Router::new()
        .merge(pricing_routes())
        .merge(vitals_routes())
        .merge(patient_routes())
        .merge(service_request_routes())
        .merge(visit_routes())
        .merge(notification_routes())
        .merge(medication_routes())
}

/// Create all application routes
pub fn create_routes() -> Router<HomeCareServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        // API documentation routes
        .merge(openapi::create_docs_routes())
        // API v1 routes (gateway-authenticated)
        .nest("/api/v1", api_v1_routes())
}
