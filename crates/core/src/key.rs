//! Composite aggregation key.

use serde::{Deserialize, Serialize};

use crate::form::Form;
use crate::id::ItemId;

/// The (item, form) pair every count, production entry and policy row hangs off.
///
/// Exists so aggregation maps are keyed by an explicit typed key instead of ad hoc
/// tuples. `Ord` gives deterministic iteration order for sorted outputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub item_id: ItemId,
    pub form: Form,
}

impl StockKey {
    pub fn new(item_id: ItemId, form: Form) -> Self {
        Self { item_id, form }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.item_id, self.form)
    }
}
