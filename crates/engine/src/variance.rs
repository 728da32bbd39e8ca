//! Count variance: how far actual counts land from the predicted on-hand.
//!
//! Variance is frozen into each count at submission time; this module only
//! aggregates. A count without a stored prediction carries no variance and is
//! excluded from every statistic here.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use scoopstock_catalog::Item;
use scoopstock_core::{Form, ItemId};
use scoopstock_ledger::CountEntry;

use crate::round;

/// Absolute variance percentage above which a count is flagged as high.
pub const HIGH_VARIANCE_PCT: f64 = 25.0;

/// One count with its stored prediction and the resulting variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceRow {
    pub item_id: ItemId,
    pub name: String,
    pub form: Form,
    pub date: NaiveDate,
    pub predicted: f64,
    pub actual: f64,
    pub variance: f64,
    pub variance_pct: f64,
    pub operator: Option<String>,
    pub high: bool,
}

/// Per-day rollup of variance activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVariance {
    pub date: NaiveDate,
    pub counts: u32,
    pub high_count: u32,
    pub mean_abs_variance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceSummary {
    pub total_counts: u32,
    pub counts_with_prediction: u32,
    pub high_count: u32,
    pub mean_abs_variance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub rows: Vec<VarianceRow>,
    pub daily: Vec<DailyVariance>,
    pub summary: VarianceSummary,
}

/// Build the variance report for a window of counts.
///
/// Rows are most recent date first, largest absolute variance first within a
/// date. Counts for unknown items are skipped; counts without a stored
/// prediction appear only in `summary.total_counts`.
pub fn variance_report(counts: &[CountEntry], items: &[Item]) -> VarianceReport {
    let names: BTreeMap<ItemId, &str> = items.iter().map(|it| (it.id, it.name.as_str())).collect();

    let mut rows = Vec::new();
    for count in counts {
        let Some(name) = names.get(&count.item_id) else {
            continue;
        };
        let (Some(predicted), Some(variance), Some(pct)) =
            (count.predicted, count.variance, count.variance_pct)
        else {
            continue;
        };
        rows.push(VarianceRow {
            item_id: count.item_id,
            name: (*name).to_string(),
            form: count.form,
            date: count.calendar_date(),
            predicted,
            actual: count.quantity,
            variance,
            variance_pct: round::tenths(pct),
            operator: count.operator.clone(),
            high: pct.abs() > HIGH_VARIANCE_PCT,
        });
    }
    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.variance_pct.abs().total_cmp(&a.variance_pct.abs()))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.form.cmp(&b.form))
    });

    let mut per_day: BTreeMap<NaiveDate, (u32, u32, f64)> = BTreeMap::new();
    for row in &rows {
        let (n, high, abs_sum) = per_day.entry(row.date).or_insert((0, 0, 0.0));
        *n += 1;
        if row.high {
            *high += 1;
        }
        *abs_sum += row.variance_pct.abs();
    }
    let daily: Vec<DailyVariance> = per_day
        .into_iter()
        .rev()
        .map(|(date, (n, high, abs_sum))| DailyVariance {
            date,
            counts: n,
            high_count: high,
            mean_abs_variance_pct: round::tenths(abs_sum / f64::from(n)),
        })
        .collect();

    let with_prediction = rows.len() as u32;
    let high_count = rows.iter().filter(|r| r.high).count() as u32;
    let mean_abs = if rows.is_empty() {
        0.0
    } else {
        round::tenths(
            rows.iter().map(|r| r.variance_pct.abs()).sum::<f64>() / f64::from(with_prediction),
        )
    };

    VarianceReport {
        rows,
        daily,
        summary: VarianceSummary {
            total_counts: counts.len() as u32,
            counts_with_prediction: with_prediction,
            high_count,
            mean_abs_variance_pct: mean_abs,
        },
    }
}

/// How much to trust an operator's counts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorScore {
    pub operator: String,
    /// Counts with a stored prediction; others carry no signal.
    pub counts: u32,
    pub high_variance_count: u32,
    pub mean_abs_variance_pct: f64,
    /// `100 − mean |variance %|`, floored at zero.
    pub accuracy: f64,
    pub reliability: Reliability,
}

/// Score each named operator on counting accuracy, best first.
///
/// Anonymous counts and counts without a prediction are ignored. Reliability
/// follows the share of high-variance counts: at most 10% is high trust, at
/// most 30% medium, beyond that low.
pub fn operator_scores(counts: &[CountEntry]) -> Vec<OperatorScore> {
    let mut per_op: BTreeMap<&str, (u32, u32, f64)> = BTreeMap::new();
    for count in counts {
        let (Some(op), Some(pct)) = (count.operator.as_deref(), count.variance_pct) else {
            continue;
        };
        let (n, high, abs_sum) = per_op.entry(op).or_insert((0, 0, 0.0));
        *n += 1;
        if pct.abs() > HIGH_VARIANCE_PCT {
            *high += 1;
        }
        *abs_sum += pct.abs();
    }

    let mut scores: Vec<OperatorScore> = per_op
        .into_iter()
        .map(|(op, (n, high, abs_sum))| {
            let mean_abs = abs_sum / f64::from(n);
            let high_share = f64::from(high) / f64::from(n);
            let reliability = if high_share <= 0.10 {
                Reliability::High
            } else if high_share <= 0.30 {
                Reliability::Medium
            } else {
                Reliability::Low
            };
            OperatorScore {
                operator: op.to_string(),
                counts: n,
                high_variance_count: high,
                mean_abs_variance_pct: round::tenths(mean_abs),
                accuracy: round::tenths((100.0 - mean_abs).max(0.0)),
                reliability,
            }
        })
        .collect();
    scores.sort_by(|a, b| {
        b.accuracy
            .total_cmp(&a.accuracy)
            .then_with(|| a.operator.cmp(&b.operator))
    });
    scores
}
