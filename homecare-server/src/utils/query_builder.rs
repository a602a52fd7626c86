//! Query builder utilities for consistent SQL query construction
//!
//! Eliminates duplication in list-endpoint SQL across handlers: optional
//! filters, ordering, and pagination all go through one builder.

use sqlx::query::QueryAs;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Paginated query builder for consistent query construction
///
/// Example usage:
/// ```rust,ignore
/// let mut query = PaginatedQuery::new("SELECT * FROM visits WHERE 1=1");
/// query
///     .filter_eq("patient_id", params.patient_id)
///     .filter_eq("status", params.status.as_deref())
///     .order_by("scheduled_start", "DESC")
///     .paginate(params.page, params.page_size);
///
/// let visits: Vec<Visit> = query.build().fetch_all(&pool).await?;
/// ```
pub struct PaginatedQuery<'a> {
    query: QueryBuilder<'a, Postgres>,
    page: u32,
    page_size: u32,
}

impl<'a> PaginatedQuery<'a> {
    /// Create a new paginated query builder
    ///
    /// The base query must end with a WHERE clause (use `WHERE 1=1` when
    /// there are no fixed predicates) so filters can append `AND ...`.
    pub fn new(base_query: &'static str) -> Self {
        Self {
            query: QueryBuilder::new(base_query),
            page: 1,
            page_size: 20,
        }
    }

    /// Add an equality filter (only if value is Some)
    pub fn filter_eq<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'a + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send,
    {
        if let Some(val) = value {
            self.query.push(format!(" AND {} = ", column));
            self.query.push_bind(val);
        }
        self
    }

    /// Add a `column >= value` filter
    pub fn filter_gte<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'a + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send,
    {
        self.query.push(format!(" AND {} >= ", column));
        self.query.push_bind(value);
        self
    }

    /// Filter by patient_id (common pattern)
    pub fn filter_patient(&mut self, patient_id: Option<Uuid>) -> &mut Self {
        self.filter_eq("patient_id", patient_id)
    }

    /// Filter for active records only
    pub fn filter_active(&mut self) -> &mut Self {
        self.query.push(" AND is_active = true");
        self
    }

    /// Add ORDER BY clause
    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        self.query.push(format!(" ORDER BY {} {}", column, direction));
        self
    }

    /// Add ORDER BY created_at DESC (common pattern)
    pub fn order_by_created_desc(&mut self) -> &mut Self {
        self.order_by("created_at", "DESC")
    }

    /// Apply pagination
    pub fn paginate(&mut self, page: Option<u32>, page_size: Option<u32>) -> &mut Self {
        self.page = page.unwrap_or(1).max(1);
        self.page_size = page_size.unwrap_or(20).clamp(1, 100);
        let offset = (self.page - 1) * self.page_size;
        self.query.push(" LIMIT ");
        self.query.push_bind(self.page_size as i64);
        self.query.push(" OFFSET ");
        self.query.push_bind(offset as i64);
        self
    }

    /// Build the final query
    pub fn build<T>(&mut self) -> QueryAs<'_, Postgres, T, sqlx::postgres::PgArguments>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        self.query.build_query_as()
    }

    /// Get current page
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Get current page size
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_query_builder() {
        let mut query = PaginatedQuery::new("SELECT * FROM test_table WHERE 1=1");
        query
            .filter_eq("status", Some("active"))
            .filter_active()
            .order_by("created_at", "DESC")
            .paginate(Some(2), Some(10));

        assert_eq!(query.page(), 2);
        assert_eq!(query.page_size(), 10);
    }

    #[test]
    fn test_filter_eq_with_none() {
        let mut query = PaginatedQuery::new("SELECT * FROM test_table WHERE 1=1");
        query.filter_eq("status", None::<String>);
        // No filter appended when value is None.
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_page_size_clamped() {
        let mut query = PaginatedQuery::new("SELECT * FROM test_table WHERE 1=1");
        query.paginate(Some(1), Some(500));
        assert_eq!(query.page_size(), 100);
    }
}
