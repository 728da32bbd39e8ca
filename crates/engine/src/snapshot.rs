//! Inventory state reconstruction.
//!
//! On-hand for (item, form) = most recent count + production logged strictly
//! after that count. Two bulk passes: one over the latest counts, one over the
//! production window. Cost stays linear in event count regardless of roster
//! size.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use scoopstock_core::StockKey;
use scoopstock_ledger::{CountEntry, ProductionEntry};

/// Reconstructed on-hand state for one (item, form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnHandEntry {
    pub key: StockKey,
    pub on_hand: f64,
    pub last_count: f64,
    pub last_counted_at: Option<DateTime<Utc>>,
    pub produced_since: f64,
}

/// Keyed snapshot; `BTreeMap` so iteration order is deterministic.
pub type Snapshot = BTreeMap<StockKey, OnHandEntry>;

/// Reconstruct on-hand state for every (item, form) with at least one event.
///
/// `latest_counts` must hold at most one count per key (the most recent);
/// duplicates are reduced defensively. A key with production but no count uses
/// a cutoff of one day ago, so default estimates stay finite. On-hand is
/// clamped at zero.
pub fn reconstruct(
    latest_counts: &[CountEntry],
    production: &[ProductionEntry],
    now: DateTime<Utc>,
) -> Snapshot {
    let default_cutoff = now - Duration::days(1);

    // Pass 1: latest count per key.
    let mut snapshot: Snapshot = BTreeMap::new();
    for count in latest_counts {
        let entry = snapshot.entry(count.key()).or_insert_with(|| OnHandEntry {
            key: count.key(),
            on_hand: 0.0,
            last_count: 0.0,
            last_counted_at: None,
            produced_since: 0.0,
        });
        if entry.last_counted_at.map_or(true, |t| t < count.counted_at) {
            entry.last_count = count.quantity;
            entry.last_counted_at = Some(count.counted_at);
        }
    }

    // Pass 2: production strictly after each key's cutoff.
    for prod in production {
        if !prod.is_active() {
            continue;
        }
        let entry = snapshot.entry(prod.key()).or_insert_with(|| OnHandEntry {
            key: prod.key(),
            on_hand: 0.0,
            last_count: 0.0,
            last_counted_at: None,
            produced_since: 0.0,
        });
        let cutoff = entry.last_counted_at.unwrap_or(default_cutoff);
        if prod.logged_at > cutoff {
            entry.produced_since += prod.quantity;
        }
    }

    for entry in snapshot.values_mut() {
        entry.on_hand = (entry.last_count + entry.produced_since).max(0.0);
    }
    snapshot
}

/// Sum of active production in the half-open interval `(after, until]`.
pub fn production_between(
    production: &[ProductionEntry],
    key: StockKey,
    after: DateTime<Utc>,
    until: DateTime<Utc>,
) -> f64 {
    production
        .iter()
        .filter(|p| p.is_active() && p.key() == key)
        .filter(|p| p.logged_at > after && p.logged_at <= until)
        .map(|p| p.quantity)
        .sum()
}
