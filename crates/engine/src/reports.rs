//! Derived reports over a queried window: production vs consumption, waste,
//! par-level accuracy, popularity ranking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scoopstock_catalog::Item;
use scoopstock_core::{Form, ItemId, StockKey};
use scoopstock_ledger::{ProductionEntry, ReplenishmentPolicy};

use crate::consumption::ConsumptionInterval;
use crate::round;

/// Produced and consumed totals for one (item, form) over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    pub item_id: ItemId,
    pub name: String,
    pub form: Form,
    pub produced: f64,
    pub consumed: f64,
    /// `produced − consumed`; positive means stock built up.
    pub net: f64,
}

/// Production against estimated consumption, per key, ordered by name then
/// form. Keys with no activity on either side are absent.
pub fn produced_vs_consumed(
    items: &[Item],
    intervals: &[ConsumptionInterval],
    production: &[ProductionEntry],
) -> Vec<FlowRow> {
    let names: BTreeMap<ItemId, &str> = items.iter().map(|it| (it.id, it.name.as_str())).collect();

    let mut totals: BTreeMap<StockKey, (f64, f64)> = BTreeMap::new();
    for prod in production.iter().filter(|p| p.is_active()) {
        totals.entry(prod.key()).or_default().0 += prod.quantity;
    }
    for interval in intervals {
        totals.entry(interval.key).or_default().1 += interval.consumed;
    }

    let mut rows: Vec<FlowRow> = totals
        .into_iter()
        .filter_map(|(key, (produced, consumed))| {
            let name = names.get(&key.item_id)?;
            Some(FlowRow {
                item_id: key.item_id,
                name: (*name).to_string(),
                form: key.form,
                produced: round::hundredths(produced),
                consumed: round::hundredths(consumed),
                net: round::hundredths(produced - consumed),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.form.cmp(&b.form)));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRow {
    pub item_id: ItemId,
    pub name: String,
    pub form: Form,
    pub produced: f64,
    pub consumed: f64,
    pub surplus: f64,
    /// Surplus as a share of production.
    pub surplus_pct: f64,
}

/// Keys where production outpaced consumption, biggest surplus first.
///
/// Consumption here is the estimate from count deltas, so "waste" reads as
/// "made more than the shop moved", not literal spoilage.
pub fn waste_report(
    items: &[Item],
    intervals: &[ConsumptionInterval],
    production: &[ProductionEntry],
) -> Vec<WasteRow> {
    let mut rows: Vec<WasteRow> = produced_vs_consumed(items, intervals, production)
        .into_iter()
        .filter(|r| r.produced > 0.0 && r.net > 0.0)
        .map(|r| WasteRow {
            item_id: r.item_id,
            name: r.name,
            form: r.form,
            produced: r.produced,
            consumed: r.consumed,
            surplus: r.net,
            surplus_pct: round::tenths(r.net / r.produced * 100.0),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.surplus
            .total_cmp(&a.surplus)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.form.cmp(&b.form))
    });
    rows
}

/// Verdict on a configured target level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParAssessment {
    TooLow,
    TooHigh,
    WellSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParAccuracyRow {
    pub item_id: ItemId,
    pub name: String,
    pub form: Form,
    pub target: f64,
    pub avg_daily_consumed: f64,
    /// Average daily consumption plus a 20% buffer, never below one unit.
    pub suggested_target: f64,
    pub assessment: ParAssessment,
    pub action: Option<String>,
}

/// Judge each tracked target against observed consumption.
///
/// The daily average divides total consumption by the number of distinct
/// interval dates, so multiple counts on one day do not dilute it. Keys with
/// no qualifying consumption are skipped: no signal, no verdict. A target
/// above 1.5x the average is too high, below 0.8x too low.
pub fn par_accuracy(
    items: &[Item],
    policies: &[ReplenishmentPolicy],
    intervals: &[ConsumptionInterval],
) -> Vec<ParAccuracyRow> {
    let names: BTreeMap<ItemId, &str> = items.iter().map(|it| (it.id, it.name.as_str())).collect();

    let mut consumed: BTreeMap<StockKey, (f64, std::collections::BTreeSet<chrono::NaiveDate>)> =
        BTreeMap::new();
    for interval in intervals {
        let (total, dates) = consumed.entry(interval.key).or_default();
        *total += interval.consumed;
        dates.insert(interval.date);
    }

    let mut rows = Vec::new();
    for policy in policies.iter().filter(|p| p.is_tracked()) {
        let Some(name) = names.get(&policy.item_id) else {
            continue;
        };
        let Some((total, dates)) = consumed.get(&policy.key()) else {
            continue;
        };
        let avg = total / dates.len() as f64;
        if avg <= 0.0 {
            continue;
        }
        let suggested = (avg * 1.2).round().max(1.0);
        let ratio = policy.target / avg;
        let (assessment, action) = if ratio > 1.5 {
            (ParAssessment::TooHigh, Some(format!("Lower to {suggested}")))
        } else if ratio < 0.8 {
            (ParAssessment::TooLow, Some(format!("Raise to {suggested}")))
        } else {
            (ParAssessment::WellSet, None)
        };
        rows.push(ParAccuracyRow {
            item_id: policy.item_id,
            name: (*name).to_string(),
            form: policy.form,
            target: policy.target,
            avg_daily_consumed: round::tenths(avg),
            suggested_target: suggested,
            assessment,
            action,
        });
    }
    rows.sort_by(|a, b| {
        a.assessment
            .cmp(&b.assessment)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.form.cmp(&b.form))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityRow {
    pub rank: u32,
    pub item_id: ItemId,
    pub name: String,
    /// Consumption summed across every form of the item.
    pub total_consumed: f64,
    /// Per-form contribution to the total.
    pub by_form: BTreeMap<Form, f64>,
}

/// Items ranked by total estimated consumption, busiest first.
pub fn popularity(items: &[Item], intervals: &[ConsumptionInterval]) -> Vec<PopularityRow> {
    let names: BTreeMap<ItemId, &str> = items.iter().map(|it| (it.id, it.name.as_str())).collect();

    let mut totals: BTreeMap<ItemId, BTreeMap<Form, f64>> = BTreeMap::new();
    for interval in intervals {
        if names.contains_key(&interval.key.item_id) {
            *totals
                .entry(interval.key.item_id)
                .or_default()
                .entry(interval.key.form)
                .or_default() += interval.consumed;
        }
    }

    let mut rows: Vec<(ItemId, f64, BTreeMap<Form, f64>)> = totals
        .into_iter()
        .map(|(id, by_form)| {
            let total = by_form.values().sum();
            (id, total, by_form)
        })
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| names[&a.0].cmp(names[&b.0])));
    rows.into_iter()
        .enumerate()
        .map(|(i, (id, total, mut by_form))| {
            for consumed in by_form.values_mut() {
                *consumed = round::hundredths(*consumed);
            }
            PopularityRow {
                rank: i as u32 + 1,
                item_id: id,
                name: names[&id].to_string(),
                total_consumed: round::hundredths(total),
                by_form,
            }
        })
        .collect()
}
