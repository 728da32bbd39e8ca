//! Replenishment planning: the morning make-list and the stock alerts.
//!
//! Both share one reconstructed on-hand snapshot. The make-list turns policy
//! into a prioritized, quantity-exact production plan; alerts classify every
//! observed (item, form) into an urgency tier with a human-readable message.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use scoopstock_catalog::Item;
use scoopstock_core::{Form, ItemId, StockKey};
use scoopstock_ledger::{ReplenishmentPolicy, MIN_BATCH_YIELD};

use crate::round;
use crate::snapshot::Snapshot;

/// Per-form stock status, worst first so `min` picks the most urgent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Critical,
    BelowPar,
    Stocked,
}

/// Batches required to cover `deficit`.
///
/// Stepped model when a subsequent yield is configured: the first batch makes
/// `first_yield`, every later batch in the run makes `subsequent`. Without a
/// subsequent yield the flat model applies and fractional batches are allowed.
pub fn batches_needed(deficit: f64, first_yield: f64, subsequent: Option<f64>) -> f64 {
    let first = first_yield.max(MIN_BATCH_YIELD);
    if deficit <= 0.0 {
        return 0.0;
    }
    match subsequent {
        Some(s) if s > 0.0 => {
            if deficit <= first {
                1.0
            } else {
                1.0 + ((deficit - first) / s).ceil()
            }
        }
        _ => deficit / first,
    }
}

/// Plan for one (item, form) on the make-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormPlan {
    pub on_hand: f64,
    pub target: f64,
    pub minimum: f64,
    pub first_batch_yield: f64,
    pub subsequent_batch_yield: Option<f64>,
    pub deficit: f64,
    pub batches_needed: f64,
    pub status: StockStatus,
}

/// One make-list row: an item with its per-form plans and combined batch need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeListRow {
    pub item_id: ItemId,
    pub name: String,
    pub category: String,
    pub is_weekend: bool,
    pub forms: BTreeMap<Form, FormPlan>,
    /// Sum of per-form batch needs, rounded to the nearest half batch;
    /// one run can be split across forms of the same item.
    pub total_batches: f64,
    pub status: StockStatus,
}

/// Build the make-list for `today`.
///
/// Only active items participate, and only forms with a positive effective
/// target. Output is sorted by status tier, then total batch need descending,
/// then name, so identical input yields identical output.
pub fn make_list(
    items: &[Item],
    policies: &[ReplenishmentPolicy],
    snapshot: &Snapshot,
    today: NaiveDate,
) -> Vec<MakeListRow> {
    let weekend = scoopstock_ledger::is_weekend(today);
    let roster: BTreeMap<ItemId, &Item> = items
        .iter()
        .filter(|it| it.is_active())
        .map(|it| (it.id, it))
        .collect();

    let mut rows: BTreeMap<ItemId, MakeListRow> = BTreeMap::new();
    for policy in policies {
        let Some(item) = roster.get(&policy.item_id) else {
            continue;
        };
        let target = policy.effective_target(today);
        if target <= 0.0 {
            continue;
        }

        let on_hand = snapshot
            .get(&policy.key())
            .map(|e| e.on_hand)
            .unwrap_or(0.0);
        let deficit = (target - on_hand).max(0.0);
        let batches = batches_needed(deficit, policy.first_batch_yield, policy.subsequent_batch_yield);
        let status = if on_hand <= policy.minimum && deficit > 0.0 {
            StockStatus::Critical
        } else if deficit > 0.0 {
            StockStatus::BelowPar
        } else {
            StockStatus::Stocked
        };

        let row = rows.entry(policy.item_id).or_insert_with(|| MakeListRow {
            item_id: policy.item_id,
            name: item.name.clone(),
            category: item.category.clone(),
            is_weekend: weekend,
            forms: BTreeMap::new(),
            total_batches: 0.0,
            status: StockStatus::Stocked,
        });
        row.forms.insert(
            policy.form,
            FormPlan {
                on_hand,
                target,
                minimum: policy.minimum,
                first_batch_yield: policy.first_batch_yield,
                subsequent_batch_yield: policy.subsequent_batch_yield,
                deficit,
                batches_needed: batches,
                status,
            },
        );
    }

    let mut out: Vec<MakeListRow> = rows
        .into_values()
        .map(|mut row| {
            let total: f64 = row.forms.values().map(|p| p.batches_needed).sum();
            row.total_batches = if total > 0.0 { round::halves(total) } else { 0.0 };
            row.status = row
                .forms
                .values()
                .map(|p| p.status)
                .min()
                .unwrap_or(StockStatus::Stocked);
            row
        })
        .collect();

    out.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| b.total_batches.total_cmp(&a.total_batches))
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

/// Alert urgency tiers, in output order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Warning,
    Low,
    Overstocked,
}

/// A stock alert for one (item, form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub item_id: ItemId,
    pub name: String,
    pub form: Form,
    pub on_hand: f64,
    pub target: Option<f64>,
    pub minimum: Option<f64>,
    pub avg_daily: f64,
    pub days_left: Option<f64>,
    pub urgency: Urgency,
    pub message: String,
}

/// Classify every snapshot key into an alert tier.
///
/// Tracked policies alert on par levels; untracked keys fall back to pure
/// consumption velocity and are skipped entirely when there is no signal.
/// Keys with no events never reach here: they are absent from the snapshot.
pub fn alerts(
    items: &[Item],
    policies: &[ReplenishmentPolicy],
    snapshot: &Snapshot,
    avg_daily: &BTreeMap<StockKey, f64>,
    today: NaiveDate,
) -> Vec<Alert> {
    let roster: BTreeMap<ItemId, &Item> = items
        .iter()
        .filter(|it| it.is_active())
        .map(|it| (it.id, it))
        .collect();
    let policy_map: BTreeMap<StockKey, &ReplenishmentPolicy> =
        policies.iter().map(|p| (p.key(), p)).collect();

    let mut out = Vec::new();
    for entry in snapshot.values() {
        let Some(item) = roster.get(&entry.key.item_id) else {
            continue;
        };
        let on_hand = entry.on_hand;
        let avg_raw = avg_daily.get(&entry.key).copied().unwrap_or(0.0);
        let avg = round::tenths(avg_raw);

        let tracked = policy_map.get(&entry.key).filter(|p| p.is_tracked());
        if let Some(policy) = tracked {
            let target = policy.effective_target(today);
            let (urgency, message) = if on_hand <= policy.minimum {
                (
                    Urgency::Critical,
                    format!(
                        "MAKE NOW - only {on_hand} left (minimum is {})",
                        policy.minimum
                    ),
                )
            } else if on_hand < target {
                let deficit = target - on_hand;
                (
                    Urgency::Warning,
                    format!("Below target - have {on_hand}, want {target} (need {deficit} more)"),
                )
            } else if on_hand > target * 1.5 {
                (
                    Urgency::Overstocked,
                    format!("Overstocked - have {on_hand}, target is {target} (waste risk)"),
                )
            } else {
                continue;
            };
            out.push(Alert {
                item_id: entry.key.item_id,
                name: item.name.clone(),
                form: entry.key.form,
                on_hand,
                target: Some(target),
                minimum: Some(policy.minimum),
                avg_daily: avg,
                days_left: None,
                urgency,
                message,
            });
        } else {
            // Consumption-based fallback. Zero average with stock on hand is
            // "insufficient data", not "no demand": skip, don't alarm.
            // Tiers are judged on the unrounded ratio; rounding first could
            // shift a key sitting near a boundary into the wrong tier.
            let days_left_raw = if avg_raw > 0.0 {
                on_hand / avg_raw
            } else if on_hand == 0.0 {
                0.0
            } else {
                continue;
            };
            let urgency = if days_left_raw <= 1.0 {
                Urgency::Critical
            } else if days_left_raw <= 2.0 {
                Urgency::Warning
            } else if days_left_raw <= 3.0 {
                Urgency::Low
            } else {
                continue;
            };
            let days_left = round::tenths(days_left_raw);
            out.push(Alert {
                item_id: entry.key.item_id,
                name: item.name.clone(),
                form: entry.key.form,
                on_hand,
                target: None,
                minimum: None,
                avg_daily: avg,
                days_left: Some(days_left),
                urgency,
                message: format!("{on_hand} left · avg {avg}/day · ~{days_left} days"),
            });
        }
    }

    out.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.form.cmp(&b.form))
    });
    out
}
