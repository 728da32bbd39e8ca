//! `scoopstock-service` — the application front door.
//!
//! Orchestrates the store and the pure planning engine: every operation is a
//! bounded read (or one atomic write batch) against the store plus a pure
//! computation, with "now" supplied by the caller. No background state.

pub mod config;
pub mod dto;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use service::{CountSubmission, DashboardSummary, InventoryService};
