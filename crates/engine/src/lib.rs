//! `scoopstock-engine` — the estimation-and-planning core.
//!
//! Everything here is a pure function over a queried event window: no store
//! access, no shared mutable state, "now" passed in explicitly. The service
//! layer performs the bounded reads and feeds the slices in.

pub mod consumption;
pub mod defaults;
pub mod planner;
pub mod reports;
pub mod snapshot;
pub mod variance;

pub use consumption::{average_daily, intervals, ConsumptionInterval};
pub use defaults::{count_defaults, CountDefault};
pub use planner::{
    alerts, batches_needed, make_list, Alert, FormPlan, MakeListRow, StockStatus, Urgency,
};
pub use reports::{
    par_accuracy, popularity, produced_vs_consumed, waste_report, FlowRow, ParAccuracyRow,
    ParAssessment, PopularityRow, WasteRow,
};
pub use snapshot::{reconstruct, OnHandEntry, Snapshot};
pub use variance::{
    operator_scores, variance_report, DailyVariance, OperatorScore, Reliability, VarianceReport,
    VarianceRow, VarianceSummary, HIGH_VARIANCE_PCT,
};

pub(crate) mod round {
    /// Round to one decimal place.
    pub fn tenths(x: f64) -> f64 {
        (x * 10.0).round() / 10.0
    }

    /// Round to two decimal places.
    pub fn hundredths(x: f64) -> f64 {
        (x * 100.0).round() / 100.0
    }

    /// Round to the nearest half unit.
    pub fn halves(x: f64) -> f64 {
        (x * 2.0).round() / 2.0
    }
}
