//! Service catalog and pricing endpoints
//!
//! The catalog is a set of services, each with a flat table of priced
//! line-items. The hierarchical view nests those items into a tree and is
//! the one read that goes through the cache.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;
use uuid::Uuid;

use pricing_service::{
    CareService, CareServiceUpdate, HierarchicalService, NewCareService, NewServiceItem,
    ServiceItem, ServiceItemUpdate,
};

use crate::cache::{hierarchy_key, CATALOG_PREFIX};
use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::HomeCareServer;
use crate::validation::RequestValidation;
use crate::{validate_field, validate_length, validate_required};

/// Distinguishes an omitted field from an explicit null
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListServicesParams {
    /// Include deactivated services
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
}

impl RequestValidation for CreateServiceRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Service name is required");
        validate_length!(self.name, 2, 200, "Service name must be between 2 and 200 characters");
        for price in [
            self.base_price_daily,
            self.base_price_monthly,
            self.base_price_hourly,
        ]
        .into_iter()
        .flatten()
        {
            validate_field!(price, price >= Decimal::ZERO, "Prices must not be negative");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl RequestValidation for UpdateServiceRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            validate_required!(name, "Service name must not be blank");
            validate_length!(name, 2, 200, "Service name must be between 2 and 200 characters");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub is_required: bool,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
    #[serde(default)]
    pub sort_order: i32,
}

impl RequestValidation for CreateItemRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.name, "Item name is required");
        validate_length!(self.name, 1, 200, "Item name must be between 1 and 200 characters");
        validate_field!(self.level, self.level >= 0, "Item level must not be negative");
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    /// Double-optional on the wire: omitted leaves the parent untouched,
    /// an explicit null moves the item to the root level
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub is_required: Option<bool>,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
    pub sort_order: Option<i32>,
}

impl RequestValidation for UpdateItemRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            validate_required!(name, "Item name must not be blank");
        }
        Ok(())
    }
}

/// List catalog services
#[utoipa::path(
    get,
    path = "/api/v1/pricing/services",
    params(ListServicesParams),
    responses(
        (status = 200, description = "Services retrieved successfully", body = Vec<CareService>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn list_services(
    State(server): State<HomeCareServer>,
    Query(params): Query<ListServicesParams>,
) -> Result<Json<ApiResponse<Vec<CareService>>>, ApiError> {
    let services = server
        .catalog
        .list_services(params.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(api_success(services)))
}

/// Create a catalog service
#[utoipa::path(
    post,
    path = "/api/v1/pricing/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created successfully", body = CareService),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn create_service(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CareService>>), ApiError> {
    request.validate()?;

    let service = server
        .catalog
        .create_service(NewCareService {
            name: request.name,
            description: request.description,
            base_price_daily: request.base_price_daily,
            base_price_monthly: request.base_price_monthly,
            base_price_hourly: request.base_price_hourly,
        })
        .await?;

    server
        .audit
        .log_catalog_action(&auth, service.id, "create", None)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(service))))
}

/// Get a catalog service
#[utoipa::path(
    get,
    path = "/api/v1/pricing/services/{service_id}",
    params(("service_id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service retrieved successfully", body = CareService),
        (status = 404, description = "Service not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn get_service(
    State(server): State<HomeCareServer>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CareService>>, ApiError> {
    let service = server.catalog.get_service(service_id).await?;
    Ok(Json(api_success(service)))
}

/// Get the nested hierarchy view of a service
///
/// This is the read path the catalog UI renders from. Results are cached;
/// any catalog write invalidates them.
#[utoipa::path(
    get,
    path = "/api/v1/pricing/services/{service_id}/hierarchy",
    params(("service_id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Hierarchy retrieved successfully", body = HierarchicalService),
        (status = 404, description = "Service not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn get_service_hierarchy(
    State(server): State<HomeCareServer>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ApiResponse<HierarchicalService>>, ApiError> {
    let key = hierarchy_key(service_id);
    if let Some(cached) = server.cache.get::<HierarchicalService>(&key).await {
        debug!(%service_id, "hierarchy served from cache");
        return Ok(Json(api_success(cached)));
    }

    let hierarchical = server.catalog.hierarchical_service(service_id).await?;
    server.cache.set(&key, &hierarchical).await;
    Ok(Json(api_success(hierarchical)))
}

/// Update a catalog service
#[utoipa::path(
    put,
    path = "/api/v1/pricing/services/{service_id}",
    request_body = UpdateServiceRequest,
    params(("service_id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service updated successfully", body = CareService),
        (status = 404, description = "Service not found"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn update_service(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<CareService>>, ApiError> {
    request.validate()?;

    let service = server
        .catalog
        .update_service(
            service_id,
            CareServiceUpdate {
                name: request.name,
                description: request.description,
                base_price_daily: request.base_price_daily,
                base_price_monthly: request.base_price_monthly,
                base_price_hourly: request.base_price_hourly,
                is_active: request.is_active,
            },
        )
        .await?;

    server.cache.invalidate_prefix(CATALOG_PREFIX).await;
    server
        .audit
        .log_catalog_action(&auth, service_id, "update", None)
        .await?;

    Ok(Json(api_success(service)))
}

/// Deactivate a catalog service (soft delete)
#[utoipa::path(
    delete,
    path = "/api/v1/pricing/services/{service_id}",
    params(("service_id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 204, description = "Service deactivated successfully"),
        (status = 404, description = "Service not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_service(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(service_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    server.catalog.deactivate_service(service_id).await?;
    server.cache.invalidate_prefix(CATALOG_PREFIX).await;
    server
        .audit
        .log_catalog_action(&auth, service_id, "deactivate", None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the flat line-items of a service
#[utoipa::path(
    get,
    path = "/api/v1/pricing/services/{service_id}/items",
    params(("service_id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Items retrieved successfully", body = Vec<ServiceItem>),
        (status = 404, description = "Service not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn list_items(
    State(server): State<HomeCareServer>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ServiceItem>>>, ApiError> {
    let items = server.catalog.list_items(service_id).await?;
    Ok(Json(api_success(items)))
}

/// Add a line-item to a service
#[utoipa::path(
    post,
    path = "/api/v1/pricing/services/{service_id}/items",
    request_body = CreateItemRequest,
    params(("service_id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 201, description = "Item created successfully", body = ServiceItem),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Service not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn create_item(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path(service_id): Path<Uuid>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceItem>>), ApiError> {
    request.validate()?;

    let item = server
        .catalog
        .create_item(
            service_id,
            NewServiceItem {
                parent_id: request.parent_id,
                name: request.name,
                description: request.description,
                level: request.level,
                is_required: request.is_required,
                base_price_daily: request.base_price_daily,
                base_price_monthly: request.base_price_monthly,
                base_price_hourly: request.base_price_hourly,
                sort_order: request.sort_order,
            },
        )
        .await?;

    server.cache.invalidate(&hierarchy_key(service_id)).await;
    server
        .audit
        .log_action(&auth, "service_item", item.id, "create", None)
        .await?;

    Ok((StatusCode::CREATED, Json(api_success(item))))
}

/// Update a line-item
#[utoipa::path(
    put,
    path = "/api/v1/pricing/services/{service_id}/items/{item_id}",
    request_body = UpdateItemRequest,
    params(
        ("service_id" = Uuid, Path, description = "Service ID"),
        ("item_id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item updated successfully", body = ServiceItem),
        (status = 404, description = "Item not found"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn update_item(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path((service_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ApiResponse<ServiceItem>>, ApiError> {
    request.validate()?;

    let item = server
        .catalog
        .update_item(
            item_id,
            ServiceItemUpdate {
                parent_id: request.parent_id,
                name: request.name,
                description: request.description,
                level: request.level,
                is_required: request.is_required,
                base_price_daily: request.base_price_daily,
                base_price_monthly: request.base_price_monthly,
                base_price_hourly: request.base_price_hourly,
                sort_order: request.sort_order,
            },
        )
        .await?;

    server.cache.invalidate(&hierarchy_key(service_id)).await;
    server
        .audit
        .log_action(&auth, "service_item", item_id, "update", None)
        .await?;

    Ok(Json(api_success(item)))
}

/// Remove a line-item
#[utoipa::path(
    delete,
    path = "/api/v1/pricing/services/{service_id}/items/{item_id}",
    params(
        ("service_id" = Uuid, Path, description = "Service ID"),
        ("item_id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted successfully"),
        (status = 404, description = "Item not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "pricing",
    security(("bearer_auth" = []))
)]
pub async fn delete_item(
    State(server): State<HomeCareServer>,
    auth: AuthContext,
    Path((service_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    server.catalog.delete_item(item_id).await?;
    server.cache.invalidate(&hierarchy_key(service_id)).await;
    server
        .audit
        .log_action(&auth, "service_item", item_id, "delete", None)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
