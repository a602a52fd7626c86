//! Vitals Engine for the Home-Care Platform
//!
//! Provides vital-sign capabilities for caregivers in the field:
//! - Recording of patient vital signs
//! - Threshold evaluation against configurable normal ranges
//! - Severity-classified alert generation
//! - Rolling trend analysis over a lookback window

pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod trends;

pub use engine::*;
pub use error::*;
pub use models::*;
pub use repository::*;
pub use trends::*;
