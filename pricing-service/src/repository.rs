//! Catalog persistence over sqlx
//!
//! Handlers pass pre-validated input; referential data (the flat item list
//! of one service) is loaded here and handed to the hierarchy builder.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::hierarchy::build_hierarchy;
use crate::models::{CareService, HierarchicalService, ServiceItem};

/// Insert parameters for a catalog service
#[derive(Debug, Clone)]
pub struct NewCareService {
    pub name: String,
    pub description: Option<String>,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
}

/// Partial update for a catalog service; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct CareServiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Insert parameters for a service line-item
#[derive(Debug, Clone)]
pub struct NewServiceItem {
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub level: i32,
    pub is_required: bool,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
    pub sort_order: i32,
}

/// Partial update for a service line-item
#[derive(Debug, Clone, Default)]
pub struct ServiceItemUpdate {
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

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_services(&self, include_inactive: bool) -> CatalogResult<Vec<CareService>> {
        let query = if include_inactive {
            "SELECT * FROM care_services ORDER BY name ASC"
        } else {
            "SELECT * FROM care_services WHERE is_active = true ORDER BY name ASC"
        };
        let services = sqlx::query_as::<_, CareService>(query)
            .fetch_all(&self.pool)
            .await?;
        Ok(services)
    }

    pub async fn get_service(&self, service_id: Uuid) -> CatalogResult<CareService> {
        sqlx::query_as::<_, CareService>("SELECT * FROM care_services WHERE id = $1")
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CatalogError::ServiceNotFound(service_id))
    }

    pub async fn create_service(&self, new: NewCareService) -> CatalogResult<CareService> {
        let service = sqlx::query_as::<_, CareService>(
            r#"
            INSERT INTO care_services (
                id, name, description, base_price_daily, base_price_monthly,
                base_price_hourly, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, true, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.base_price_daily)
        .bind(new.base_price_monthly)
        .bind(new.base_price_hourly)
        .fetch_one(&self.pool)
        .await?;
        Ok(service)
    }

    pub async fn update_service(
        &self,
        service_id: Uuid,
        update: CareServiceUpdate,
    ) -> CatalogResult<CareService> {
        sqlx::query_as::<_, CareService>(
            r#"
            UPDATE care_services SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                base_price_daily = COALESCE($3, base_price_daily),
                base_price_monthly = COALESCE($4, base_price_monthly),
                base_price_hourly = COALESCE($5, base_price_hourly),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.base_price_daily)
        .bind(update.base_price_monthly)
        .bind(update.base_price_hourly)
        .bind(update.is_active)
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CatalogError::ServiceNotFound(service_id))
    }

    /// Soft delete: the service disappears from active listings but keeps
    /// its rows for historical service requests.
    pub async fn deactivate_service(&self, service_id: Uuid) -> CatalogResult<()> {
        let rows = sqlx::query(
            "UPDATE care_services SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(service_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if rows == 0 {
            return Err(CatalogError::ServiceNotFound(service_id));
        }
        Ok(())
    }

    pub async fn list_items(&self, service_id: Uuid) -> CatalogResult<Vec<ServiceItem>> {
        let items = sqlx::query_as::<_, ServiceItem>(
            "SELECT * FROM service_items WHERE service_id = $1 ORDER BY sort_order ASC, name ASC",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn create_item(
        &self,
        service_id: Uuid,
        new: NewServiceItem,
    ) -> CatalogResult<ServiceItem> {
        // Parent must belong to the same service when given.
        if let Some(parent_id) = new.parent_id {
            let parent_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM service_items WHERE id = $1 AND service_id = $2)",
            )
            .bind(parent_id)
            .bind(service_id)
            .fetch_one(&self.pool)
            .await?;
            if !parent_exists {
                return Err(CatalogError::ItemNotFound(parent_id));
            }
        }

        let item = sqlx::query_as::<_, ServiceItem>(
            r#"
            INSERT INTO service_items (
                id, service_id, parent_id, name, description, level, is_required,
                base_price_daily, base_price_monthly, base_price_hourly,
                sort_order, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(service_id)
        .bind(new.parent_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.level)
        .bind(new.is_required)
        .bind(new.base_price_daily)
        .bind(new.base_price_monthly)
        .bind(new.base_price_hourly)
        .bind(new.sort_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        item_id: Uuid,
        update: ServiceItemUpdate,
    ) -> CatalogResult<ServiceItem> {
        sqlx::query_as::<_, ServiceItem>(
            r#"
            UPDATE service_items SET
                parent_id = CASE WHEN $1 THEN $2 ELSE parent_id END,
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                level = COALESCE($5, level),
                is_required = COALESCE($6, is_required),
                base_price_daily = COALESCE($7, base_price_daily),
                base_price_monthly = COALESCE($8, base_price_monthly),
                base_price_hourly = COALESCE($9, base_price_hourly),
                sort_order = COALESCE($10, sort_order),
                updated_at = NOW()
            WHERE id = $11
            RETURNING *
            "#,
        )
        .bind(update.parent_id.is_some())
        .bind(update.parent_id.flatten())
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.level)
        .bind(update.is_required)
        .bind(update.base_price_daily)
        .bind(update.base_price_monthly)
        .bind(update.base_price_hourly)
        .bind(update.sort_order)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CatalogError::ItemNotFound(item_id))
    }

    pub async fn delete_item(&self, item_id: Uuid) -> CatalogResult<()> {
        let rows = sqlx::query("DELETE FROM service_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(CatalogError::ItemNotFound(item_id));
        }
        Ok(())
    }

    /// Service plus its freshly built item tree
    pub async fn hierarchical_service(&self, service_id: Uuid) -> CatalogResult<HierarchicalService> {
        let service = self.get_service(service_id).await?;
        let items = self.list_items(service_id).await?;
        Ok(HierarchicalService {
            id: service.id,
            name: service.name.clone(),
            description: service.description.clone(),
            base_price: service.base_price(),
            items: build_hierarchy(&items, None),
        })
    }
}
