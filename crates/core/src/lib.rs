//! `scoopstock-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod form;
pub mod id;
pub mod key;

pub use error::{DomainError, DomainResult};
pub use form::Form;
pub use id::{ItemId, ProductionId};
pub use key::StockKey;
