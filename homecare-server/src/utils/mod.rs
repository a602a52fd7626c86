//! Shared utilities

pub mod query_builder;

pub use query_builder::PaginatedQuery;
