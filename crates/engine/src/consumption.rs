//! Consumption estimation from count deltas.
//!
//! For consecutive counts of one (item, form):
//! `consumed = prev.quantity + production(prev, curr] − curr.quantity`.
//! Negative intervals are data anomalies (typically a missed production log)
//! and are excluded from both the numerator and the divisor, never clamped.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scoopstock_core::StockKey;
use scoopstock_ledger::{CountEntry, ProductionEntry};

use crate::snapshot::production_between;

/// Consumption observed between two consecutive counts of one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionInterval {
    pub key: StockKey,
    pub consumed: f64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Calendar date the interval is attributed to (the closing count's date).
    pub date: NaiveDate,
}

/// Qualifying (non-negative) consumption intervals for every key in the window.
///
/// `counts` may arrive in any order; they are grouped per key and sorted by
/// time. Per-key computation is independent, with no shared state across keys.
pub fn intervals(
    counts: &[CountEntry],
    production: &[ProductionEntry],
) -> Vec<ConsumptionInterval> {
    let mut by_key: BTreeMap<StockKey, Vec<&CountEntry>> = BTreeMap::new();
    for count in counts {
        by_key.entry(count.key()).or_default().push(count);
    }

    let mut out = Vec::new();
    for (key, mut series) in by_key {
        series.sort_by_key(|c| c.counted_at);
        for pair in series.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let produced = production_between(production, key, prev.counted_at, curr.counted_at);
            let consumed = prev.quantity + produced - curr.quantity;
            if consumed < 0.0 {
                // Anomaly: skip entirely rather than clamping to zero.
                continue;
            }
            out.push(ConsumptionInterval {
                key,
                consumed,
                period_start: prev.counted_at,
                period_end: curr.counted_at,
                date: curr.counted_at.date_naive(),
            });
        }
    }
    out
}

/// Average daily consumption per key: the mean of per-interval consumption.
///
/// Keys with fewer than two qualifying intervals are omitted; callers read an
/// absent key as zero, meaning "insufficient data" rather than "no demand".
pub fn average_daily(intervals: &[ConsumptionInterval]) -> BTreeMap<StockKey, f64> {
    let mut totals: BTreeMap<StockKey, (f64, u32)> = BTreeMap::new();
    for interval in intervals {
        let (sum, n) = totals.entry(interval.key).or_insert((0.0, 0));
        *sum += interval.consumed;
        *n += 1;
    }
    totals
        .into_iter()
        .filter(|(_, (_, n))| *n >= 2)
        .map(|(key, (sum, n))| (key, sum / f64::from(n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use scoopstock_core::{Form, ItemId};

    fn count(item: ItemId, qty: f64, days_ago: i64, now: DateTime<Utc>) -> CountEntry {
        CountEntry::record(item, Form::Pint, qty, now - Duration::days(days_ago), None, None)
    }

    fn prod(item: ItemId, qty: f64, days_ago: i64, now: DateTime<Utc>) -> ProductionEntry {
        ProductionEntry::log(item, Form::Pint, qty, now - Duration::days(days_ago), None)
    }

    #[test]
    fn interval_accounts_for_production_between_counts() {
        let now = Utc::now();
        let item = ItemId::new();
        // 10 counted, 6 produced, 9 left: consumed 7.
        let counts = [count(item, 10.0, 3, now), count(item, 9.0, 1, now)];
        let production = [prod(item, 6.0, 2, now)];

        let ivals = intervals(&counts, &production);
        assert_eq!(ivals.len(), 1);
        assert_eq!(ivals[0].consumed, 7.0);
    }

    #[test]
    fn negative_interval_is_excluded_not_clamped() {
        let now = Utc::now();
        let item = ItemId::new();
        // Count went up with no production logged: anomaly.
        let counts = [
            count(item, 4.0, 4, now),
            count(item, 9.0, 3, now),
            count(item, 6.0, 2, now),
            count(item, 3.0, 1, now),
        ];

        let ivals = intervals(&counts, &[]);
        assert_eq!(ivals.len(), 2);
        let avg = average_daily(&ivals);
        // Mean of 3 and 3; the -5 interval contributes to neither side.
        assert_eq!(avg[&StockKey::new(item, Form::Pint)], 3.0);
    }

    #[test]
    fn fewer_than_two_qualifying_intervals_reports_zero() {
        let now = Utc::now();
        let item = ItemId::new();
        let key = StockKey::new(item, Form::Pint);

        // One count: no interval at all.
        let one = [count(item, 10.0, 1, now)];
        assert!(average_daily(&intervals(&one, &[])).get(&key).is_none());

        // Two counts: a single qualifying interval still reports zero.
        let two = [count(item, 10.0, 2, now), count(item, 7.0, 1, now)];
        let avg = average_daily(&intervals(&two, &[]));
        assert_eq!(avg.get(&key).copied().unwrap_or(0.0), 0.0);
    }

    #[test]
    fn keys_are_estimated_independently() {
        let now = Utc::now();
        let a = ItemId::new();
        let b = ItemId::new();
        let counts = [
            count(a, 10.0, 3, now),
            count(a, 8.0, 2, now),
            count(a, 6.0, 1, now),
            count(b, 5.0, 1, now),
        ];

        let avg = average_daily(&intervals(&counts, &[]));
        assert_eq!(avg[&StockKey::new(a, Form::Pint)], 2.0);
        assert!(avg.get(&StockKey::new(b, Form::Pint)).is_none());
    }

    #[test]
    fn retracted_production_does_not_inflate_consumption() {
        let now = Utc::now();
        let item = ItemId::new();
        let counts = [
            count(item, 10.0, 3, now),
            count(item, 9.0, 2, now),
            count(item, 8.0, 1, now),
        ];
        let mut retracted = prod(item, 6.0, 2, now);
        retracted.retract(now, "MG").unwrap();

        let avg = average_daily(&intervals(&counts, &[retracted]));
        assert_eq!(avg[&StockKey::new(item, Form::Pint)], 1.0);
    }
}
