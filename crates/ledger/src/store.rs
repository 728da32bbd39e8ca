//! The store boundary.
//!
//! Single shared writable resource; every engine invocation performs its own
//! bounded read through this trait. Implementations arbitrate concurrent
//! writers themselves (the in-memory store with a lock, a database with its
//! transactional guarantees).

use chrono::{DateTime, Utc};
use thiserror::Error;

use scoopstock_catalog::{Item, ItemStatus};
use scoopstock_core::{DomainError, DomainResult, ItemId, ProductionId};

use crate::entry::{CountEntry, ProductionEntry};
use crate::policy::ReplenishmentPolicy;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found")]
    ItemNotFound,

    #[error("production entry not found")]
    ProductionNotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Lock poisoning or a backend failure; callers treat this as fatal for
    /// the current request only.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Roster query filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ItemFilter {
    #[default]
    Active,
    ActiveAndDiscontinued,
    Status(ItemStatus),
    All,
}

impl ItemFilter {
    pub fn matches(&self, status: ItemStatus) -> bool {
        match self {
            ItemFilter::Active => status == ItemStatus::Active,
            ItemFilter::ActiveAndDiscontinued => status != ItemStatus::Archived,
            ItemFilter::Status(s) => status == *s,
            ItemFilter::All => true,
        }
    }
}

pub trait StockStore: Send + Sync {
    // ----- roster -----

    /// Insert a new item. Names are unique across the roster.
    fn insert_item(&self, item: Item) -> StoreResult<()>;

    fn item(&self, id: ItemId) -> StoreResult<Item>;

    /// Items matching the filter, ordered by (category, name).
    fn items(&self, filter: ItemFilter) -> StoreResult<Vec<Item>>;

    /// Read-modify-write of a single item under the store's write arbitration.
    /// The mutation result is committed only when the closure succeeds.
    fn update_item(
        &self,
        id: ItemId,
        mutate: &mut dyn FnMut(&mut Item) -> DomainResult<()>,
    ) -> StoreResult<Item>;

    // ----- policies -----

    fn upsert_policy(&self, policy: ReplenishmentPolicy) -> StoreResult<()>;

    /// All policy rows, ordered by key.
    fn policies(&self) -> StoreResult<Vec<ReplenishmentPolicy>>;

    // ----- counts -----

    /// Commit a batch of counts as one unit, upserting per
    /// (item, form, calendar date). Returns the number of entries applied.
    fn upsert_counts(&self, entries: Vec<CountEntry>) -> StoreResult<usize>;

    /// Counts with `counted_at` in `[since, until]`, ordered by key then time.
    fn counts_in_window(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<CountEntry>>;

    /// One bulk pass: the most recent count per (item, form), ordered by key.
    fn latest_counts(&self) -> StoreResult<Vec<CountEntry>>;

    // ----- production -----

    fn append_production(&self, entry: ProductionEntry) -> StoreResult<ProductionEntry>;

    fn retract_production(
        &self,
        id: ProductionId,
        at: DateTime<Utc>,
        by: String,
    ) -> StoreResult<ProductionEntry>;

    /// Production with `logged_at` in `[since, until]`, ordered by time.
    /// Retracted entries are excluded unless `include_retracted`.
    fn production_in_window(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        include_retracted: bool,
    ) -> StoreResult<Vec<ProductionEntry>>;

    // ----- lifecycle -----

    /// Discontinue every listed item, all-or-nothing: if any transition is
    /// invalid, nothing is committed.
    fn apply_discontinuations(&self, ids: &[ItemId], now: DateTime<Utc>) -> StoreResult<usize>;

    /// Refresh the `last_counted_at` cache for the given items from their
    /// stored counts. Best-effort from the caller's perspective.
    fn refresh_last_counted(&self, ids: &[ItemId]) -> StoreResult<()>;
}
