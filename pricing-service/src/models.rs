use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog service offered to patients (e.g. "Basic Home Care")
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CareService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat, persisted service line-item
///
/// `parent_id = None` marks a top-level item. `level` is a display hint
/// only; the derived tree depth is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub id: Uuid,
    pub service_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub level: i32,
    pub is_required: bool,
    pub base_price_daily: Option<Decimal>,
    pub base_price_monthly: Option<Decimal>,
    pub base_price_hourly: Option<Decimal>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived tree node, rebuilt on every read and never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItemNode {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub level: i32,
    pub is_optional: bool,
    pub base_price: Decimal,
    pub sort_order: i32,
    pub children: Vec<ServiceItemNode>,
}

/// Catalog service with its item tree attached
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub items: Vec<ServiceItemNode>,
}

/// Select the first populated tier price: daily, then monthly, then hourly.
/// Falls back to zero when no tier is set.
pub fn tier_price(
    daily: Option<Decimal>,
    monthly: Option<Decimal>,
    hourly: Option<Decimal>,
) -> Decimal {
    daily.or(monthly).or(hourly).unwrap_or(Decimal::ZERO)
}

impl CareService {
    /// Displayed price for the service itself, via the tier fallback
    pub fn base_price(&self) -> Decimal {
        tier_price(
            self.base_price_daily,
            self.base_price_monthly,
            self.base_price_hourly,
        )
    }
}

impl ServiceItem {
    pub fn base_price(&self) -> Decimal {
        tier_price(
            self.base_price_daily,
            self.base_price_monthly,
            self.base_price_hourly,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tier_price_prefers_daily() {
        assert_eq!(
            tier_price(Some(dec!(10)), Some(dec!(200)), Some(dec!(3))),
            dec!(10)
        );
    }

    #[test]
    fn tier_price_falls_back_to_monthly_then_hourly() {
        assert_eq!(tier_price(None, Some(dec!(200)), Some(dec!(3))), dec!(200));
        assert_eq!(tier_price(None, None, Some(dec!(3))), dec!(3));
    }

    #[test]
    fn tier_price_defaults_to_zero() {
        assert_eq!(tier_price(None, None, None), Decimal::ZERO);
    }
}
