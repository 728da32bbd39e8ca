//! In-memory store for tests/dev.
//!
//! Write arbitration is a single `RwLock`; every method takes the lock once,
//! so each call is one atomically committed state change.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};

use scoopstock_catalog::Item;
use scoopstock_core::{DomainResult, ItemId, ProductionId, StockKey};

use crate::entry::{CountEntry, ProductionEntry};
use crate::policy::ReplenishmentPolicy;
use crate::store::{ItemFilter, StockStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<ItemId, Item>,
    counts: BTreeMap<(StockKey, NaiveDate), CountEntry>,
    production: Vec<ProductionEntry>,
    policies: BTreeMap<StockKey, ReplenishmentPolicy>,
}

#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    inner: RwLock<Inner>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl StockStore for InMemoryStockStore {
    fn insert_item(&self, item: Item) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.items.values().any(|it| it.name == item.name) {
            return Err(StoreError::Conflict(format!(
                "item '{}' already exists",
                item.name
            )));
        }
        inner.items.insert(item.id, item);
        Ok(())
    }

    fn item(&self, id: ItemId) -> StoreResult<Item> {
        let inner = self.read()?;
        inner.items.get(&id).cloned().ok_or(StoreError::ItemNotFound)
    }

    fn items(&self, filter: ItemFilter) -> StoreResult<Vec<Item>> {
        let inner = self.read()?;
        let mut items: Vec<Item> = inner
            .items
            .values()
            .filter(|it| filter.matches(it.status))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }

    fn update_item(
        &self,
        id: ItemId,
        mutate: &mut dyn FnMut(&mut Item) -> DomainResult<()>,
    ) -> StoreResult<Item> {
        let mut inner = self.write()?;
        let item = inner.items.get_mut(&id).ok_or(StoreError::ItemNotFound)?;
        // Mutate a copy so a failed closure leaves the stored item untouched.
        let mut updated = item.clone();
        mutate(&mut updated)?;
        *item = updated.clone();
        Ok(updated)
    }

    fn upsert_policy(&self, policy: ReplenishmentPolicy) -> StoreResult<()> {
        let mut inner = self.write()?;
        if !inner.items.contains_key(&policy.item_id) {
            return Err(StoreError::ItemNotFound);
        }
        inner.policies.insert(policy.key(), policy);
        Ok(())
    }

    fn policies(&self) -> StoreResult<Vec<ReplenishmentPolicy>> {
        let inner = self.read()?;
        Ok(inner.policies.values().cloned().collect())
    }

    fn upsert_counts(&self, entries: Vec<CountEntry>) -> StoreResult<usize> {
        let mut inner = self.write()?;
        for entry in &entries {
            if !inner.items.contains_key(&entry.item_id) {
                return Err(StoreError::ItemNotFound);
            }
        }
        let applied = entries.len();
        for entry in entries {
            inner
                .counts
                .insert((entry.key(), entry.calendar_date()), entry);
        }
        Ok(applied)
    }

    fn counts_in_window(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<CountEntry>> {
        let inner = self.read()?;
        let mut counts: Vec<CountEntry> = inner
            .counts
            .values()
            .filter(|c| c.counted_at >= since && c.counted_at <= until)
            .cloned()
            .collect();
        counts.sort_by(|a, b| a.key().cmp(&b.key()).then_with(|| a.counted_at.cmp(&b.counted_at)));
        Ok(counts)
    }

    fn latest_counts(&self) -> StoreResult<Vec<CountEntry>> {
        let inner = self.read()?;
        let mut latest: BTreeMap<StockKey, CountEntry> = BTreeMap::new();
        for count in inner.counts.values() {
            match latest.get(&count.key()) {
                Some(prev) if prev.counted_at >= count.counted_at => {}
                _ => {
                    latest.insert(count.key(), count.clone());
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    fn append_production(&self, entry: ProductionEntry) -> StoreResult<ProductionEntry> {
        let mut inner = self.write()?;
        if !inner.items.contains_key(&entry.item_id) {
            return Err(StoreError::ItemNotFound);
        }
        inner.production.push(entry.clone());
        Ok(entry)
    }

    fn retract_production(
        &self,
        id: ProductionId,
        at: DateTime<Utc>,
        by: String,
    ) -> StoreResult<ProductionEntry> {
        let mut inner = self.write()?;
        let entry = inner
            .production
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::ProductionNotFound)?;
        entry.retract(at, by)?;
        Ok(entry.clone())
    }

    fn production_in_window(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        include_retracted: bool,
    ) -> StoreResult<Vec<ProductionEntry>> {
        let inner = self.read()?;
        let mut entries: Vec<ProductionEntry> = inner
            .production
            .iter()
            .filter(|p| p.logged_at >= since && p.logged_at <= until)
            .filter(|p| include_retracted || p.is_active())
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.logged_at.cmp(&b.logged_at).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    fn apply_discontinuations(&self, ids: &[ItemId], now: DateTime<Utc>) -> StoreResult<usize> {
        let mut inner = self.write()?;

        // Validate every transition on copies first; commit only if all pass.
        let mut updated: Vec<Item> = Vec::with_capacity(ids.len());
        for id in ids {
            let mut item = inner
                .items
                .get(id)
                .cloned()
                .ok_or(StoreError::ItemNotFound)?;
            item.auto_discontinue(now)?;
            updated.push(item);
        }

        let applied = updated.len();
        for item in updated {
            inner.items.insert(item.id, item);
        }
        Ok(applied)
    }

    fn refresh_last_counted(&self, ids: &[ItemId]) -> StoreResult<()> {
        let mut inner = self.write()?;
        for id in ids {
            let latest = inner
                .counts
                .values()
                .filter(|c| c.item_id == *id)
                .map(|c| c.counted_at)
                .max();
            if let (Some(at), Some(item)) = (latest, inner.items.get_mut(id)) {
                item.record_counted(at);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use scoopstock_core::Form;

    fn seeded_item(store: &InMemoryStockStore, name: &str, category: &str) -> Item {
        let item = Item::new(ItemId::new(), name, category, Utc::now()).unwrap();
        store.insert_item(item.clone()).unwrap();
        item
    }

    #[test]
    fn duplicate_item_names_conflict() {
        let store = InMemoryStockStore::new();
        seeded_item(&store, "Vanilla", "classics");
        let dup = Item::new(ItemId::new(), "Vanilla", "classics", Utc::now()).unwrap();
        assert!(matches!(store.insert_item(dup), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn count_upsert_keeps_last_writer_per_calendar_date() {
        let store = InMemoryStockStore::new();
        let item = seeded_item(&store, "Vanilla", "classics");
        // Mid-day, so two hours later is still the same calendar date.
        let at = Utc.with_ymd_and_hms(2026, 8, 20, 10, 0, 0).unwrap();

        let first = CountEntry::record(item.id, Form::Pint, 10.0, at, None, None);
        let second = CountEntry::record(item.id, Form::Pint, 8.0, at + Duration::hours(2), None, None);
        store.upsert_counts(vec![first]).unwrap();
        store.upsert_counts(vec![second]).unwrap();

        let counts = store.counts_in_window(at - Duration::days(1), at + Duration::days(1)).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].quantity, 8.0);
    }

    #[test]
    fn counts_on_different_dates_do_not_collide() {
        let store = InMemoryStockStore::new();
        let item = seeded_item(&store, "Vanilla", "classics");
        let at = Utc::now();

        store
            .upsert_counts(vec![
                CountEntry::record(item.id, Form::Pint, 10.0, at - Duration::days(1), None, None),
                CountEntry::record(item.id, Form::Pint, 8.0, at, None, None),
            ])
            .unwrap();

        let counts = store.counts_in_window(at - Duration::days(7), at).unwrap();
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn counts_for_unknown_items_are_rejected_before_any_write() {
        let store = InMemoryStockStore::new();
        let item = seeded_item(&store, "Vanilla", "classics");
        let at = Utc::now();

        let result = store.upsert_counts(vec![
            CountEntry::record(item.id, Form::Pint, 10.0, at, None, None),
            CountEntry::record(ItemId::new(), Form::Pint, 5.0, at, None, None),
        ]);
        assert!(matches!(result, Err(StoreError::ItemNotFound)));
        assert!(store
            .counts_in_window(at - Duration::days(1), at)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn retracted_production_is_excluded_from_window_reads() {
        let store = InMemoryStockStore::new();
        let item = seeded_item(&store, "Vanilla", "classics");
        let at = Utc::now();

        let entry = store
            .append_production(ProductionEntry::log(item.id, Form::Tub, 3.0, at, None))
            .unwrap();
        store
            .retract_production(entry.id, at, "AH".to_string())
            .unwrap();

        let active = store
            .production_in_window(at - Duration::days(1), at, false)
            .unwrap();
        assert!(active.is_empty());

        let all = store
            .production_in_window(at - Duration::days(1), at, true)
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].retraction.as_ref().unwrap().by, "AH");
    }

    #[test]
    fn discontinuation_sweep_is_all_or_nothing() {
        let store = InMemoryStockStore::new();
        let now = Utc::now();
        let specialty = seeded_item(&store, "Lavender", "specialty");
        let mut manual = Item::new(ItemId::new(), "Saffron", "specialty", now).unwrap();
        manual.discontinue_manually(now).unwrap();
        store.insert_item(manual.clone()).unwrap();

        // Second id is invalid to sweep; the first must not be committed either.
        let result = store.apply_discontinuations(&[specialty.id, manual.id], now);
        assert!(result.is_err());
        assert!(store.item(specialty.id).unwrap().is_active());
    }

    #[test]
    fn refresh_last_counted_uses_most_recent_count() {
        let store = InMemoryStockStore::new();
        let item = seeded_item(&store, "Vanilla", "classics");
        let at = Utc::now();

        store
            .upsert_counts(vec![
                CountEntry::record(item.id, Form::Pint, 10.0, at - Duration::days(2), None, None),
                CountEntry::record(item.id, Form::Tub, 2.0, at, None, None),
            ])
            .unwrap();
        store.refresh_last_counted(&[item.id]).unwrap();
        assert_eq!(store.item(item.id).unwrap().last_counted_at, Some(at));
    }
}
