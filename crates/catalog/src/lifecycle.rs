//! Automatic retirement sweep for specialty items.
//!
//! Both queries here are pure: they look at item metadata and the count-recency
//! cache and report what should happen. Applying the transitions (atomically)
//! is the store's job.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use scoopstock_core::ItemId;

use crate::item::{Item, ItemStatus};

/// Thresholds for the sweep and the at-risk warning window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Days without a count before a specialty item is auto-discontinued.
    pub discontinue_after_days: i64,
    /// Days without a count before a specialty item shows up as at risk.
    pub warn_after_days: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            discontinue_after_days: 21,
            warn_after_days: 14,
        }
    }
}

/// A specialty item approaching automatic discontinuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskItem {
    pub item_id: ItemId,
    pub name: String,
    pub category: String,
    pub last_counted_at: Option<DateTime<Utc>>,
    pub days_since_count: i64,
    pub days_until_discontinue: i64,
}

/// Items the sweep should discontinue right now.
///
/// Eligible: active, specialty-class, not manually discontinued, and either
/// never counted or last counted before the discontinue cutoff.
pub fn sweep_candidates<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
) -> Vec<ItemId> {
    let cutoff = now - Duration::days(config.discontinue_after_days);
    let mut ids: Vec<ItemId> = items
        .into_iter()
        .filter(|it| {
            it.status == ItemStatus::Active
                && !it.manually_discontinued
                && it.is_specialty()
                && it.last_counted_at.map_or(true, |t| t < cutoff)
        })
        .map(|it| it.id)
        .collect();
    ids.sort();
    ids
}

/// Specialty items between the warning and discontinue thresholds.
///
/// A never-counted item uses its creation time as the reference point when
/// reporting how long it has gone uncounted.
pub fn at_risk<'a>(
    items: impl IntoIterator<Item = &'a Item>,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
) -> Vec<AtRiskItem> {
    let warn_cutoff = now - Duration::days(config.warn_after_days);
    let discontinue_cutoff = now - Duration::days(config.discontinue_after_days);

    let mut rows: Vec<AtRiskItem> = items
        .into_iter()
        .filter(|it| it.status == ItemStatus::Active && it.is_specialty())
        .filter(|it| match it.last_counted_at {
            None => true,
            Some(t) => t < warn_cutoff && t >= discontinue_cutoff,
        })
        .map(|it| {
            let reference = it.last_counted_at.unwrap_or(it.created_at);
            let days_since = (now - reference).num_days();
            AtRiskItem {
                item_id: it.id,
                name: it.name.clone(),
                category: it.category.clone(),
                last_counted_at: it.last_counted_at,
                days_since_count: days_since,
                days_until_discontinue: config.discontinue_after_days - days_since,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.days_until_discontinue
            .cmp(&b.days_until_discontinue)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoopstock_core::ItemId;

    fn item(category: &str, counted_days_ago: Option<i64>, now: DateTime<Utc>) -> Item {
        let mut it = Item::new(ItemId::new(), "Lavender Honey", category, now - Duration::days(60))
            .unwrap();
        it.last_counted_at = counted_days_ago.map(|d| now - Duration::days(d));
        it
    }

    #[test]
    fn stale_specialty_item_is_swept() {
        let now = Utc::now();
        let it = item("specialty", Some(22), now);
        let ids = sweep_candidates([&it], now, &LifecycleConfig::default());
        assert_eq!(ids, vec![it.id]);
    }

    #[test]
    fn stale_non_specialty_item_is_not_swept() {
        let now = Utc::now();
        let it = item("classics", Some(22), now);
        assert!(sweep_candidates([&it], now, &LifecycleConfig::default()).is_empty());
    }

    #[test]
    fn recently_counted_specialty_is_not_swept() {
        let now = Utc::now();
        let it = item("seasonal", Some(5), now);
        assert!(sweep_candidates([&it], now, &LifecycleConfig::default()).is_empty());
    }

    #[test]
    fn never_counted_specialty_is_swept() {
        let now = Utc::now();
        let it = item("specials", None, now);
        assert_eq!(
            sweep_candidates([&it], now, &LifecycleConfig::default()),
            vec![it.id]
        );
    }

    #[test]
    fn manual_discontinuation_blocks_the_sweep() {
        let now = Utc::now();
        let mut it = item("specialty", Some(30), now);
        it.discontinue_manually(now).unwrap();
        it.reactivate().unwrap();
        it.discontinue_manually(now).unwrap();
        assert!(sweep_candidates([&it], now, &LifecycleConfig::default()).is_empty());
    }

    #[test]
    fn at_risk_window_sits_between_thresholds() {
        let now = Utc::now();
        let warned = item("specialty", Some(16), now);
        let fresh = item("specialty", Some(3), now);
        let expired = item("specialty", Some(25), now);

        let rows = at_risk([&warned, &fresh, &expired], now, &LifecycleConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, warned.id);
        assert_eq!(rows[0].days_since_count, 16);
        assert_eq!(rows[0].days_until_discontinue, 5);
    }

    #[test]
    fn never_counted_item_reports_days_from_creation() {
        let now = Utc::now();
        let it = item("seasonal", None, now);
        let rows = at_risk([&it], now, &LifecycleConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].days_since_count, 60);
        assert_eq!(rows[0].days_until_discontinue, 21 - 60);
    }
}
