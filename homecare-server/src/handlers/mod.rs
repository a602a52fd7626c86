//! HTTP request handlers

pub mod health;
pub mod medications;
pub mod notifications;
pub mod patients;
pub mod pricing;
pub mod service_requests;
pub mod visits;
pub mod vitals;
