use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::server::HomeCareServer;

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::handlers::health::health_check,
        crate::handlers::health::version_info,
        crate::handlers::health::system_status,

        // Service catalog endpoints
        crate::handlers::pricing::list_services,
        crate::handlers::pricing::create_service,
        crate::handlers::pricing::get_service,
        crate::handlers::pricing::get_service_hierarchy,
        crate::handlers::pricing::update_service,
        crate::handlers::pricing::deactivate_service,
        crate::handlers::pricing::list_items,
        crate::handlers::pricing::create_item,
        crate::handlers::pricing::update_item,
        crate::handlers::pricing::delete_item,

        // Vital signs endpoints
        crate::handlers::vitals::record_vitals,
        crate::handlers::vitals::list_vitals,
        crate::handlers::vitals::get_vitals,
        crate::handlers::vitals::get_trends,
        crate::handlers::vitals::list_alerts,
        crate::handlers::vitals::acknowledge_alert,
        crate::handlers::vitals::list_ranges,
        crate::handlers::vitals::create_range,

        // Patient endpoints
        crate::handlers::patients::list_patients,
        crate::handlers::patients::create_patient,
        crate::handlers::patients::get_patient,
        crate::handlers::patients::update_patient,
        crate::handlers::patients::review_patient,

        // Service request endpoints
        crate::handlers::service_requests::list_service_requests,
        crate::handlers::service_requests::create_service_request,
        crate::handlers::service_requests::get_service_request,
        crate::handlers::service_requests::update_service_request,

        // Visit endpoints
        crate::handlers::visits::list_visits,
        crate::handlers::visits::create_visit,
        crate::handlers::visits::get_visit,
        crate::handlers::visits::update_visit,
        crate::handlers::visits::cancel_visit,

        // Notification endpoints
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::create_notification,
        crate::handlers::notifications::mark_notification_read,
        crate::handlers::notifications::bulk_mark_read,
        crate::handlers::notifications::delete_notification,

        // Medication endpoints
        crate::handlers::medications::list_medications,
        crate::handlers::medications::create_medication,
        crate::handlers::medications::get_medication,
        crate::handlers::medications::update_medication,
        crate::handlers::medications::list_administrations,
        crate::handlers::medications::record_administration,
    ),
    components(
        schemas(
            // Health schemas
            crate::handlers::health::HealthResponse,
            crate::handlers::health::VersionResponse,
            crate::handlers::health::StatusResponse,

            // Service catalog schemas
            pricing_service::CareService,
            pricing_service::ServiceItem,
            pricing_service::ServiceItemNode,
            pricing_service::HierarchicalService,
            crate::handlers::pricing::CreateServiceRequest,
            crate::handlers::pricing::UpdateServiceRequest,
            crate::handlers::pricing::CreateItemRequest,
            crate::handlers::pricing::UpdateItemRequest,

            // Vital signs schemas
            vitals_engine::BloodPressure,
            vitals_engine::VitalSigns,
            vitals_engine::NewVitalSigns,
            vitals_engine::VitalRange,
            vitals_engine::VitalType,
            vitals_engine::AlertSeverity,
            vitals_engine::VitalAlert,
            vitals_engine::VitalsTrend,
            vitals_engine::TrendPoint,
            vitals_engine::TrendDirection,
            vitals_engine::TimeRange,
            crate::handlers::vitals::CreateRangeRequest,

            // Patient schemas
            crate::handlers::patients::Patient,
            crate::handlers::patients::CreatePatientRequest,
            crate::handlers::patients::UpdatePatientRequest,
            crate::handlers::patients::ReviewPatientRequest,

            // Service request schemas
            crate::handlers::service_requests::ServiceRequest,
            crate::handlers::service_requests::CreateServiceRequestRequest,
            crate::handlers::service_requests::UpdateServiceRequestRequest,

            // Visit schemas
            crate::handlers::visits::Visit,
            crate::handlers::visits::CreateVisitRequest,
            crate::handlers::visits::UpdateVisitRequest,
            crate::handlers::visits::CancelVisitRequest,

            // Notification schemas
            crate::handlers::notifications::Notification,
            crate::handlers::notifications::CreateNotificationRequest,
            crate::handlers::notifications::BulkMarkReadRequest,
            crate::handlers::notifications::BulkMarkReadResponse,

            // Medication schemas
            crate::handlers::medications::Medication,
            crate::handlers::medications::MedicationAdministration,
            crate::handlers::medications::CreateMedicationRequest,
            crate::handlers::medications::UpdateMedicationRequest,
            crate::handlers::medications::RecordAdministrationRequest,
        )
    ),
    tags(
        (name = "health", description = "System health and status endpoints"),
        (name = "pricing", description = "Care service catalog and pricing management"),
        (name = "vitals", description = "Patient vital signs monitoring and alerting"),
        (name = "patients", description = "Patient intake and management"),
        (name = "service-requests", description = "Service request lifecycle"),
        (name = "visits", description = "Visit scheduling and tracking"),
        (name = "notifications", description = "User notifications"),
        (name = "medications", description = "Medication tracking and administration logs"),
    ),
    info(
        title = "HomeCare Platform API",
        version = "1.0.0",
        description = "Home-care service management platform: service catalog with hierarchical pricing, patient intake, visit scheduling, vital signs monitoring with threshold alerting, and medication tracking.",
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
)]
pub struct ApiDoc;

/// Create OpenAPI documentation routes
///
/// The raw document is served as JSON; UI rendering is left to external
/// tooling pointed at this endpoint.
pub fn create_docs_routes() -> Router<HomeCareServer> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
