//! Prefilled estimates for the count sheet.
//!
//! Before an operator walks the freezer, every tracked (item, form) gets a
//! predicted on-hand: reconstructed stock minus one day of average
//! consumption, floored at zero. The prediction is stored with the submitted
//! count and becomes the variance baseline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scoopstock_catalog::Item;
use scoopstock_core::{Form, ItemId, StockKey};
use scoopstock_ledger::ReplenishmentPolicy;

use crate::round;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountDefault {
    pub item_id: ItemId,
    pub name: String,
    pub category: String,
    pub form: Form,
    pub last_count: Option<f64>,
    pub last_counted_at: Option<DateTime<Utc>>,
    pub produced_since: f64,
    pub avg_daily: f64,
    /// Suggested entry: `max(0, on_hand − avg_daily)`.
    pub estimated: f64,
}

/// Prefill every tracked pair of every active item, ordered by category, name,
/// form. Pairs with no event history estimate from zero.
pub fn count_defaults(
    items: &[Item],
    policies: &[ReplenishmentPolicy],
    snapshot: &Snapshot,
    avg_daily: &BTreeMap<StockKey, f64>,
) -> Vec<CountDefault> {
    let roster: BTreeMap<ItemId, &Item> = items
        .iter()
        .filter(|it| it.is_active())
        .map(|it| (it.id, it))
        .collect();

    let mut out = Vec::new();
    for policy in policies.iter().filter(|p| p.is_tracked()) {
        let Some(item) = roster.get(&policy.item_id) else {
            continue;
        };
        let key = policy.key();
        let entry = snapshot.get(&key);
        let on_hand = entry.map_or(0.0, |e| e.on_hand);
        let avg = avg_daily.get(&key).copied().unwrap_or(0.0);
        out.push(CountDefault {
            item_id: policy.item_id,
            name: item.name.clone(),
            category: item.category.clone(),
            form: policy.form,
            last_count: entry.and_then(|e| e.last_counted_at.map(|_| e.last_count)),
            last_counted_at: entry.and_then(|e| e.last_counted_at),
            produced_since: entry.map_or(0.0, |e| e.produced_since),
            avg_daily: round::tenths(avg),
            estimated: round::hundredths((on_hand - avg).max(0.0)),
        });
    }
    out.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.form.cmp(&b.form))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use scoopstock_ledger::{CountEntry, ProductionEntry};

    fn item(name: &str) -> Item {
        Item::new(ItemId::new(), name, "classics", Utc::now()).unwrap()
    }

    fn policy(item_id: ItemId, form: Form, target: f64) -> ReplenishmentPolicy {
        ReplenishmentPolicy {
            item_id,
            form,
            target,
            minimum: 2.0,
            first_batch_yield: 2.5,
            subsequent_batch_yield: None,
            weekend_target: None,
        }
    }

    #[test]
    fn estimate_is_on_hand_less_one_day_of_demand() {
        let now = Utc::now();
        let it = item("Vanilla");
        let key = StockKey::new(it.id, Form::Pint);
        let counts = [CountEntry::record(
            it.id,
            Form::Pint,
            10.0,
            now - Duration::days(1),
            None,
            None,
        )];
        let production = [ProductionEntry::log(it.id, Form::Pint, 2.0, now, None)];
        let snap = crate::snapshot::reconstruct(&counts, &production, now);
        let mut avg = BTreeMap::new();
        avg.insert(key, 3.0);

        let defaults = count_defaults(&[it.clone()], &[policy(it.id, Form::Pint, 8.0)], &snap, &avg);
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].last_count, Some(10.0));
        assert_eq!(defaults[0].produced_since, 2.0);
        assert_eq!(defaults[0].estimated, 9.0);
    }

    #[test]
    fn estimate_never_goes_negative() {
        let now = Utc::now();
        let it = item("Vanilla");
        let key = StockKey::new(it.id, Form::Pint);
        let counts = [CountEntry::record(it.id, Form::Pint, 1.0, now, None, None)];
        let snap = crate::snapshot::reconstruct(&counts, &[], now);
        let mut avg = BTreeMap::new();
        avg.insert(key, 5.0);

        let defaults = count_defaults(&[it.clone()], &[policy(it.id, Form::Pint, 8.0)], &snap, &avg);
        assert_eq!(defaults[0].estimated, 0.0);
    }

    #[test]
    fn never_counted_pair_is_prefilled_from_zero() {
        let it = item("Vanilla");
        let defaults = count_defaults(
            &[it.clone()],
            &[policy(it.id, Form::Tub, 4.0)],
            &Snapshot::new(),
            &BTreeMap::new(),
        );
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].last_count, None);
        assert_eq!(defaults[0].estimated, 0.0);
    }

    #[test]
    fn untracked_pairs_and_inactive_items_are_omitted() {
        let now = Utc::now();
        let active = item("Vanilla");
        let mut retired = item("Eggnog");
        retired.discontinue_manually(now).unwrap();

        let defaults = count_defaults(
            &[active.clone(), retired.clone()],
            &[
                policy(active.id, Form::Tub, 0.0),
                policy(retired.id, Form::Tub, 4.0),
            ],
            &Snapshot::new(),
            &BTreeMap::new(),
        );
        assert!(defaults.is_empty());
    }

    #[test]
    fn ordering_is_category_then_name_then_form() {
        let a = item("Apple");
        let b = item("Banana");
        let defaults = count_defaults(
            &[b.clone(), a.clone()],
            &[
                policy(b.id, Form::Tub, 4.0),
                policy(a.id, Form::Pint, 4.0),
                policy(a.id, Form::Tub, 4.0),
            ],
            &Snapshot::new(),
            &BTreeMap::new(),
        );
        let keys: Vec<(&str, Form)> = defaults.iter().map(|d| (d.name.as_str(), d.form)).collect();
        assert_eq!(
            keys,
            vec![("Apple", Form::Tub), ("Apple", Form::Pint), ("Banana", Form::Tub)]
        );
    }
}
