use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scoopstock_core::{DomainError, DomainResult, Form, ItemId, ProductionId, StockKey};

/// A physical count taken for one (item, form).
///
/// At most one entry exists per (item, form, calendar date); later submissions
/// for the same date overwrite. When the submission carried a prediction, the
/// variance fields are computed here, once, and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEntry {
    pub item_id: ItemId,
    pub form: Form,
    pub quantity: f64,
    pub counted_at: DateTime<Utc>,
    pub operator: Option<String>,
    pub predicted: Option<f64>,
    pub variance: Option<f64>,
    pub variance_pct: Option<f64>,
}

impl CountEntry {
    /// Record a count, deriving variance from the prediction supplied with it.
    ///
    /// A zero or negative prediction yields no percentage (division would be
    /// meaningless); the absolute variance is still kept.
    pub fn record(
        item_id: ItemId,
        form: Form,
        quantity: f64,
        counted_at: DateTime<Utc>,
        operator: Option<String>,
        predicted: Option<f64>,
    ) -> Self {
        let variance = predicted.map(|p| quantity - p);
        let variance_pct = match predicted {
            Some(p) if p > 0.0 => Some((quantity - p) / p * 100.0),
            _ => None,
        };
        Self {
            item_id,
            form,
            quantity,
            counted_at,
            operator,
            predicted,
            variance,
            variance_pct,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.form)
    }

    /// UTC calendar date this count belongs to; the upsert key component.
    pub fn calendar_date(&self) -> NaiveDate {
        self.counted_at.date_naive()
    }
}

/// Attribution for a retracted production entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retraction {
    pub at: DateTime<Utc>,
    pub by: String,
}

/// A production run logged for one (item, form).
///
/// Append-only. Mistaken entries are retracted (tagged, with attribution), not
/// deleted; retracted entries are excluded from every aggregate but kept for
/// audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEntry {
    pub id: ProductionId,
    pub item_id: ItemId,
    pub form: Form,
    pub quantity: f64,
    pub logged_at: DateTime<Utc>,
    pub operator: Option<String>,
    pub retraction: Option<Retraction>,
}

impl ProductionEntry {
    pub fn log(
        item_id: ItemId,
        form: Form,
        quantity: f64,
        logged_at: DateTime<Utc>,
        operator: Option<String>,
    ) -> Self {
        Self {
            id: ProductionId::new(),
            item_id,
            form,
            quantity,
            logged_at,
            operator,
            retraction: None,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.item_id, self.form)
    }

    pub fn is_active(&self) -> bool {
        self.retraction.is_none()
    }

    pub fn retract(&mut self, at: DateTime<Utc>, by: impl Into<String>) -> DomainResult<()> {
        if self.retraction.is_some() {
            return Err(DomainError::conflict("production entry is already retracted"));
        }
        self.retraction = Some(Retraction { at, by: by.into() });
        Ok(())
    }
}
