use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use scoopstock_core::{Form, ItemId, StockKey};

/// Floor for `first_batch_yield`, applied at write time and again defensively
/// in batch math, so a misconfigured tiny yield cannot blow up the division.
pub const MIN_BATCH_YIELD: f64 = 0.25;

/// Fri, Sat and Sun use the weekend target when one is set.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Fri | Weekday::Sat | Weekday::Sun)
}

/// Stocking policy for one (item, form): targets plus batch-yield parameters.
///
/// `target == 0` means the pair is not tracked: it is excluded from the
/// make-list and falls back to consumption-based alerting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentPolicy {
    pub item_id: ItemId,
    pub form: Form,
    /// Desired quantity at day start ("ready at open").
    pub target: f64,
    /// Reorder trigger ("make more at").
    pub minimum: f64,
    /// Quantity one batch yields ("one batch makes").
    pub first_batch_yield: f64,
    /// Yield of every batch after the first in the same run; enables the
    /// stepped model when set.
    pub subsequent_batch_yield: Option<f64>,
    /// Optional Fri–Sun override of `target`.
    pub weekend_target: Option<f64>,
}

impl ReplenishmentPolicy {
    /// Default policy row created per form at item creation. Untracked
    /// (target 0) until an operator sets real par levels; batch yields carry
    /// the category-tier defaults.
    pub fn default_for(item_id: ItemId, form: Form) -> Self {
        let (first, subsequent) = match form {
            Form::Tub => (2.5, 2.0),
            Form::Pint => (48.0, 40.0),
            Form::Quart => (24.0, 20.0),
        };
        Self {
            item_id,
            form,
            target: 0.0,
            minimum: 0.0,
            first_batch_yield: first,
            subsequent_batch_yield: Some(subsequent),
            weekend_target: None,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.form)
    }

    pub fn is_tracked(&self) -> bool {
        self.target > 0.0
    }

    /// Target in effect on `date`: the weekend override when the date is
    /// Fri–Sun and a positive override is configured, otherwise `target`.
    pub fn effective_target(&self, date: NaiveDate) -> f64 {
        match self.weekend_target {
            Some(w) if w > 0.0 && is_weekend(date) => w,
            _ => self.target,
        }
    }

    /// Apply write-time clamping. Stored policies always respect the yield floor.
    pub fn normalized(mut self) -> Self {
        self.first_batch_yield = self.first_batch_yield.max(MIN_BATCH_YIELD);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekend_spans_friday_through_sunday() {
        assert!(!is_weekend(date(2026, 8, 27))); // Thu
        assert!(is_weekend(date(2026, 8, 28))); // Fri
        assert!(is_weekend(date(2026, 8, 29))); // Sat
        assert!(is_weekend(date(2026, 8, 30))); // Sun
        assert!(!is_weekend(date(2026, 8, 31))); // Mon
    }

    #[test]
    fn weekend_target_only_applies_on_weekend() {
        let mut p = ReplenishmentPolicy::default_for(ItemId::new(), Form::Tub);
        p.target = 6.0;
        p.weekend_target = Some(10.0);
        assert_eq!(p.effective_target(date(2026, 8, 27)), 6.0);
        assert_eq!(p.effective_target(date(2026, 8, 29)), 10.0);
    }

    #[test]
    fn zero_weekend_target_is_treated_as_unset() {
        let mut p = ReplenishmentPolicy::default_for(ItemId::new(), Form::Pint);
        p.target = 12.0;
        p.weekend_target = Some(0.0);
        assert_eq!(p.effective_target(date(2026, 8, 29)), 12.0);
    }

    #[test]
    fn normalized_clamps_tiny_yields() {
        let mut p = ReplenishmentPolicy::default_for(ItemId::new(), Form::Quart);
        p.first_batch_yield = 0.1;
        assert_eq!(p.normalized().first_batch_yield, MIN_BATCH_YIELD);
    }

    #[test]
    fn zero_target_means_untracked() {
        let p = ReplenishmentPolicy::default_for(ItemId::new(), Form::Tub);
        assert!(!p.is_tracked());
    }
}
