//! `scoopstock-ai`
//!
//! **Responsibility:** Optional language-model subsystem boundary.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It must not depend on catalog or ledger state.
//! - It must not mutate domain state.
//! - It emits narratives and name resolutions, not ledger events.
//!
//! Everything degrades gracefully: a missing or failing model yields an
//! `Unavailable` response, never an error that blocks the caller.

pub mod insight;
pub mod parse;

pub use insight::{AiError, InsightRequest, InsightResponse, InsightService, NarrativeModel};
pub use parse::{
    match_item_name, resolve_entries, NameMatch, ParsedEntry, ResolvedEntry, Resolution,
};
