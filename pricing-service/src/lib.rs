//! Pricing Service for the Home-Care Platform
//!
//! Provides the service catalog and pricing capabilities:
//! - Catalog services with daily/monthly/hourly price tiers
//! - Flat service line-items with parent references
//! - Hierarchical item tree construction for display and price computation
//! - Catalog CRUD over the relational store

pub mod error;
pub mod hierarchy;
pub mod models;
pub mod repository;

pub use error::*;
pub use hierarchy::*;
pub use models::*;
pub use repository::*;
