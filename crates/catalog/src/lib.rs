//! `scoopstock-catalog` — the item roster and its lifecycle rules.
//!
//! Items carry a three-state lifecycle (active, discontinued, archived). Only
//! specialty-class items are eligible for the automatic retirement sweep; all
//! other transitions are explicit operator actions.

pub mod item;
pub mod lifecycle;

pub use item::{is_specialty_category, Item, ItemStatus};
pub use lifecycle::{at_risk, sweep_candidates, AtRiskItem, LifecycleConfig};
