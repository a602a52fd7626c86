//! Business services layer
//!
//! Services orchestrate between infrastructure (cache, audit trail) and
//! domain logic (repositories, models).

pub mod audit;

pub use audit::AuditService;
