use serde::Deserialize;

use scoopstock_catalog::Item;
use scoopstock_core::{Form, ItemId};
use scoopstock_engine::{Alert, MakeListRow, OnHandEntry};
use scoopstock_ledger::{CountEntry, ProductionEntry, ReplenishmentPolicy};

use crate::service::DashboardSummary;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyRequest {
    pub item_id: ItemId,
    pub form: Form,
    pub target: f64,
    pub minimum: f64,
    pub first_batch_yield: f64,
    pub subsequent_batch_yield: Option<f64>,
    pub weekend_target: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CountLine {
    pub item_id: ItemId,
    pub form: Form,
    pub quantity: f64,
    /// The estimate the operator saw on their count sheet, if they had one.
    #[serde(default)]
    pub predicted: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitCountsRequest {
    pub operator: Option<String>,
    pub lines: Vec<CountLine>,
}

#[derive(Debug, Deserialize)]
pub struct LogProductionRequest {
    pub item_id: ItemId,
    pub form: Form,
    pub quantity: f64,
    pub operator: Option<String>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(item: &Item) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.to_string(),
        "name": item.name,
        "category": item.category,
        "status": item.status,
        "last_counted_at": item.last_counted_at,
        "manually_discontinued": item.manually_discontinued,
    })
}

pub fn policy_to_json(policy: &ReplenishmentPolicy) -> serde_json::Value {
    serde_json::json!({
        "item_id": policy.item_id.to_string(),
        "form": policy.form,
        "target": policy.target,
        "minimum": policy.minimum,
        "first_batch_yield": policy.first_batch_yield,
        "subsequent_batch_yield": policy.subsequent_batch_yield,
        "weekend_target": policy.weekend_target,
        "tracked": policy.is_tracked(),
    })
}

pub fn on_hand_to_json(entry: &OnHandEntry) -> serde_json::Value {
    serde_json::json!({
        "item_id": entry.key.item_id.to_string(),
        "form": entry.key.form,
        "on_hand": entry.on_hand,
        "last_count": entry.last_count,
        "last_counted_at": entry.last_counted_at,
        "produced_since": entry.produced_since,
    })
}

pub fn count_to_json(entry: &CountEntry) -> serde_json::Value {
    serde_json::json!({
        "item_id": entry.item_id.to_string(),
        "form": entry.form,
        "quantity": entry.quantity,
        "counted_at": entry.counted_at,
        "operator": entry.operator,
        "predicted": entry.predicted,
        "variance": entry.variance,
        "variance_pct": entry.variance_pct,
    })
}

pub fn production_to_json(entry: &ProductionEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id.to_string(),
        "item_id": entry.item_id.to_string(),
        "form": entry.form,
        "quantity": entry.quantity,
        "logged_at": entry.logged_at,
        "operator": entry.operator,
        "retracted": !entry.is_active(),
    })
}

pub fn make_list_row_to_json(row: &MakeListRow) -> serde_json::Value {
    serde_json::json!({
        "item_id": row.item_id.to_string(),
        "name": row.name,
        "category": row.category,
        "is_weekend": row.is_weekend,
        "forms": row.forms,
        "total_batches": row.total_batches,
        "status": row.status,
    })
}

pub fn alert_to_json(alert: &Alert) -> serde_json::Value {
    serde_json::json!({
        "item_id": alert.item_id.to_string(),
        "name": alert.name,
        "form": alert.form,
        "on_hand": alert.on_hand,
        "urgency": alert.urgency,
        "days_left": alert.days_left,
        "message": alert.message,
    })
}

/// One payload for the dashboard view, also what the narrative model sees.
pub fn dashboard_to_json(summary: &DashboardSummary) -> serde_json::Value {
    serde_json::json!({
        "make_list": summary.make_list.iter().map(make_list_row_to_json).collect::<Vec<_>>(),
        "alerts": summary.alerts.iter().map(alert_to_json).collect::<Vec<_>>(),
        "at_risk": summary.at_risk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn item_json_uses_string_ids_and_lowercase_status() {
        let item = Item::new(ItemId::new(), "Vanilla", "classics", Utc::now()).unwrap();
        let value = item_to_json(&item);
        assert_eq!(value["status"], "active");
        assert_eq!(value["id"], item.id.to_string());
    }

    #[test]
    fn count_line_parses_form_case_insensitively() {
        let line: CountLine = serde_json::from_value(serde_json::json!({
            "item_id": ItemId::new().to_string(),
            "form": "tub",
            "quantity": 2.5,
        }))
        .unwrap();
        assert_eq!(line.form, Form::Tub);
        assert_eq!(line.quantity, 2.5);
        assert_eq!(line.predicted, None);
    }
}
