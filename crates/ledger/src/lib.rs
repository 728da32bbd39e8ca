//! `scoopstock-ledger` — persisted stock records and the store boundary.
//!
//! Count and production entries are the raw event history everything else is
//! derived from. The store trait is the single shared writable resource; each
//! engine invocation performs its own bounded read through it.

pub mod entry;
pub mod memory;
pub mod policy;
pub mod store;

pub use entry::{CountEntry, ProductionEntry, Retraction};
pub use memory::InMemoryStockStore;
pub use policy::{is_weekend, ReplenishmentPolicy, MIN_BATCH_YIELD};
pub use store::{ItemFilter, StockStore, StoreError, StoreResult};
