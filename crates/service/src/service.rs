//! The inventory application service.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use scoopstock_ai::{resolve_entries, ParsedEntry, Resolution};
use scoopstock_catalog::{at_risk, sweep_candidates, AtRiskItem, Item};
use scoopstock_core::{Form, ItemId, ProductionId, StockKey};
use scoopstock_engine as engine;
use scoopstock_engine::{Alert, CountDefault, MakeListRow, OperatorScore, Snapshot, VarianceReport};
use scoopstock_ledger::{
    CountEntry, ItemFilter, ProductionEntry, ReplenishmentPolicy, StockStore,
};

use crate::config::ServiceConfig;
use crate::dto::{
    CreateItemRequest, LogProductionRequest, PolicyRequest, SubmitCountsRequest,
    UpdateItemRequest,
};
use crate::error::{ServiceError, ServiceResult};

/// Result of committing a count batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CountSubmission {
    pub applied: usize,
    /// The entries as stored, with variance frozen in.
    pub entries: Vec<CountEntry>,
}

/// Everything the morning dashboard shows in one read.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub make_list: Vec<MakeListRow>,
    pub alerts: Vec<Alert>,
    pub at_risk: Vec<AtRiskItem>,
}

/// Application service over one store. Every method is a complete operation:
/// read what it needs, compute, commit at most once.
pub struct InventoryService<S> {
    store: S,
    config: ServiceConfig,
}

impl<S: StockStore> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: S, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ----- roster -----

    /// Create an item and seed an untracked policy row per form, so the count
    /// sheet and policy editor show the item immediately.
    pub fn create_item(&self, req: CreateItemRequest, now: DateTime<Utc>) -> ServiceResult<Item> {
        let item = Item::new(ItemId::new(), req.name, req.category, now)?;
        self.store.insert_item(item.clone())?;
        for form in Form::ALL {
            self.store
                .upsert_policy(ReplenishmentPolicy::default_for(item.id, form))?;
        }
        tracing::info!(item_id = %item.id, name = %item.name, "item created");
        Ok(item)
    }

    pub fn item(&self, id: ItemId) -> ServiceResult<Item> {
        Ok(self.store.item(id)?)
    }

    pub fn items(&self, filter: ItemFilter) -> ServiceResult<Vec<Item>> {
        Ok(self.store.items(filter)?)
    }

    /// Rename and/or recategorize an item. The roster name stays unique.
    pub fn update_item(&self, id: ItemId, req: UpdateItemRequest) -> ServiceResult<Item> {
        if let Some(name) = &req.name {
            let clash = self
                .store
                .items(ItemFilter::All)?
                .into_iter()
                .any(|it| it.id != id && it.name == *name);
            if clash {
                return Err(ServiceError::Conflict(format!(
                    "item '{name}' already exists"
                )));
            }
        }
        let item = self
            .store
            .update_item(id, &mut |it| {
                it.update_details(req.name.clone(), req.category.clone())
            })?;
        Ok(item)
    }

    pub fn discontinue_item(&self, id: ItemId, now: DateTime<Utc>) -> ServiceResult<Item> {
        let item = self
            .store
            .update_item(id, &mut |it| it.discontinue_manually(now))?;
        tracing::info!(item_id = %id, "item discontinued");
        Ok(item)
    }

    pub fn reactivate_item(&self, id: ItemId) -> ServiceResult<Item> {
        let item = self.store.update_item(id, &mut |it| it.reactivate())?;
        tracing::info!(item_id = %id, "item reactivated");
        Ok(item)
    }

    pub fn archive_item(&self, id: ItemId) -> ServiceResult<Item> {
        let item = self.store.update_item(id, &mut |it| it.archive())?;
        tracing::info!(item_id = %id, "item archived");
        Ok(item)
    }

    // ----- policies -----

    pub fn set_policy(&self, req: PolicyRequest) -> ServiceResult<ReplenishmentPolicy> {
        if req.target < 0.0 || req.minimum < 0.0 {
            return Err(ServiceError::validation("levels cannot be negative"));
        }
        if req.target > 0.0 && req.minimum > req.target {
            return Err(ServiceError::validation("minimum cannot exceed target"));
        }
        if req.first_batch_yield <= 0.0 {
            return Err(ServiceError::validation("batch yield must be positive"));
        }
        // Existence check before the write; policies never dangle.
        self.store.item(req.item_id)?;

        let policy = ReplenishmentPolicy {
            item_id: req.item_id,
            form: req.form,
            target: req.target,
            minimum: req.minimum,
            first_batch_yield: req.first_batch_yield,
            subsequent_batch_yield: req.subsequent_batch_yield.filter(|s| *s > 0.0),
            weekend_target: req.weekend_target,
        }
        .normalized();
        self.store.upsert_policy(policy.clone())?;
        Ok(policy)
    }

    /// Apply a batch of policy updates. Each row validates independently; the
    /// batch stops at the first failure.
    pub fn set_policies(
        &self,
        requests: Vec<PolicyRequest>,
    ) -> ServiceResult<Vec<ReplenishmentPolicy>> {
        let mut applied = Vec::with_capacity(requests.len());
        for req in requests {
            applied.push(self.set_policy(req)?);
        }
        Ok(applied)
    }

    pub fn policies(&self) -> ServiceResult<Vec<ReplenishmentPolicy>> {
        Ok(self.store.policies()?)
    }

    // ----- windows -----

    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        // Misconfigured windows are clamped rather than rejected.
        now - Duration::days(self.config.history_days.clamp(1, 90))
    }

    fn window_events(
        &self,
        now: DateTime<Utc>,
    ) -> ServiceResult<(Vec<CountEntry>, Vec<ProductionEntry>)> {
        let since = self.window_start(now);
        let counts = self.store.counts_in_window(since, now)?;
        let production = self.store.production_in_window(since, now, false)?;
        Ok((counts, production))
    }

    fn average_daily(&self, now: DateTime<Utc>) -> ServiceResult<BTreeMap<StockKey, f64>> {
        let (counts, production) = self.window_events(now)?;
        Ok(engine::average_daily(&engine::intervals(
            &counts,
            &production,
        )))
    }

    // ----- estimation and planning -----

    pub fn snapshot(&self, now: DateTime<Utc>) -> ServiceResult<Snapshot> {
        let latest = self.store.latest_counts()?;
        // The production read must reach back to the oldest count on file,
        // not just the reporting window, or stock made after a stale count
        // would vanish from the reconstruction. The per-key cutoff is
        // applied downstream.
        let since = latest
            .iter()
            .map(|c| c.counted_at)
            .min()
            .unwrap_or(now)
            .min(now - Duration::days(1));
        let production = self.store.production_in_window(since, now, false)?;
        Ok(engine::reconstruct(&latest, &production, now))
    }

    pub fn make_list(&self, now: DateTime<Utc>) -> ServiceResult<Vec<MakeListRow>> {
        let items = self.store.items(ItemFilter::Active)?;
        let policies = self.store.policies()?;
        let snapshot = self.snapshot(now)?;
        Ok(engine::make_list(
            &items,
            &policies,
            &snapshot,
            now.date_naive(),
        ))
    }

    pub fn alerts(&self, now: DateTime<Utc>) -> ServiceResult<Vec<Alert>> {
        let items = self.store.items(ItemFilter::Active)?;
        let policies = self.store.policies()?;
        let snapshot = self.snapshot(now)?;
        let avg_daily = self.average_daily(now)?;
        Ok(engine::alerts(
            &items,
            &policies,
            &snapshot,
            &avg_daily,
            now.date_naive(),
        ))
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> ServiceResult<DashboardSummary> {
        Ok(DashboardSummary {
            make_list: self.make_list(now)?,
            alerts: self.alerts(now)?,
            at_risk: self.at_risk_items(now)?,
        })
    }

    // ----- counts -----

    pub fn count_defaults(&self, now: DateTime<Utc>) -> ServiceResult<Vec<CountDefault>> {
        let items = self.store.items(ItemFilter::Active)?;
        let policies = self.store.policies()?;
        let snapshot = self.snapshot(now)?;
        let avg_daily = self.average_daily(now)?;
        Ok(engine::count_defaults(
            &items, &policies, &snapshot, &avg_daily,
        ))
    }

    /// Commit a count batch as one unit.
    ///
    /// The prediction frozen into each entry is the one the caller supplied
    /// with the line, which is what the operator actually saw on their sheet.
    /// Lines without one fall back to the current server-side estimate:
    /// reconstructed on-hand minus a day of demand.
    pub fn submit_counts(
        &self,
        req: SubmitCountsRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<CountSubmission> {
        if req.lines.is_empty() {
            return Err(ServiceError::validation("count batch is empty"));
        }
        for line in &req.lines {
            if !line.quantity.is_finite() || line.quantity < 0.0 {
                return Err(ServiceError::validation(format!(
                    "count for {}/{} must be a non-negative number",
                    line.item_id, line.form
                )));
            }
            if let Some(predicted) = line.predicted {
                if !predicted.is_finite() || predicted < 0.0 {
                    return Err(ServiceError::validation(format!(
                        "prediction for {}/{} must be a non-negative number",
                        line.item_id, line.form
                    )));
                }
            }
        }

        let predictions: BTreeMap<StockKey, f64> = self
            .count_defaults(now)?
            .into_iter()
            .map(|d| (StockKey::new(d.item_id, d.form), d.estimated))
            .collect();

        let entries: Vec<CountEntry> = req
            .lines
            .iter()
            .map(|line| {
                let key = StockKey::new(line.item_id, line.form);
                CountEntry::record(
                    line.item_id,
                    line.form,
                    line.quantity,
                    now,
                    req.operator.clone(),
                    line.predicted.or_else(|| predictions.get(&key).copied()),
                )
            })
            .collect();

        let applied = self.store.upsert_counts(entries.clone())?;
        let mut touched: Vec<ItemId> = entries.iter().map(|e| e.item_id).collect();
        touched.sort();
        touched.dedup();
        // The batch is already committed; a failed cache refresh only delays
        // the lifecycle clock until the next submission.
        if let Err(err) = self.store.refresh_last_counted(&touched) {
            tracing::warn!(error = %err, "count recency cache refresh failed");
        }
        tracing::info!(applied, operator = ?req.operator, "count batch committed");
        Ok(CountSubmission { applied, entries })
    }

    /// Counts in the trailing window, newest first.
    pub fn count_history(&self, now: DateTime<Utc>) -> ServiceResult<Vec<CountEntry>> {
        let mut counts = self.store.counts_in_window(self.window_start(now), now)?;
        counts.sort_by(|a, b| b.counted_at.cmp(&a.counted_at).then_with(|| a.key().cmp(&b.key())));
        Ok(counts)
    }

    // ----- production -----

    pub fn log_production(
        &self,
        req: LogProductionRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<ProductionEntry> {
        if !req.quantity.is_finite() || req.quantity <= 0.0 {
            return Err(ServiceError::validation(
                "production quantity must be positive",
            ));
        }
        let item = self.store.item(req.item_id)?;
        if !item.is_active() {
            return Err(ServiceError::Conflict(
                "cannot log production for a retired item".to_string(),
            ));
        }
        let entry = self.store.append_production(ProductionEntry::log(
            req.item_id,
            req.form,
            req.quantity,
            now,
            req.operator,
        ))?;
        tracing::info!(production_id = %entry.id, item_id = %entry.item_id, quantity = entry.quantity, "production logged");
        Ok(entry)
    }

    pub fn retract_production(
        &self,
        id: ProductionId,
        by: String,
        now: DateTime<Utc>,
    ) -> ServiceResult<ProductionEntry> {
        let entry = self.store.retract_production(id, now, by)?;
        tracing::info!(production_id = %id, "production retracted");
        Ok(entry)
    }

    /// Production entries in the trailing window, newest first.
    pub fn production_history(
        &self,
        now: DateTime<Utc>,
        include_retracted: bool,
    ) -> ServiceResult<Vec<ProductionEntry>> {
        let mut entries =
            self.store
                .production_in_window(self.window_start(now), now, include_retracted)?;
        entries.reverse();
        Ok(entries)
    }

    // ----- variance and reports -----

    pub fn variance_report(&self, now: DateTime<Utc>) -> ServiceResult<VarianceReport> {
        let items = self.store.items(ItemFilter::All)?;
        let (counts, _) = self.window_events(now)?;
        Ok(engine::variance_report(&counts, &items))
    }

    pub fn operator_scores(&self, now: DateTime<Utc>) -> ServiceResult<Vec<OperatorScore>> {
        let (counts, _) = self.window_events(now)?;
        Ok(engine::operator_scores(&counts))
    }

    pub fn produced_vs_consumed(&self, now: DateTime<Utc>) -> ServiceResult<Vec<engine::FlowRow>> {
        let items = self.store.items(ItemFilter::All)?;
        let (counts, production) = self.window_events(now)?;
        let intervals = engine::intervals(&counts, &production);
        Ok(engine::produced_vs_consumed(&items, &intervals, &production))
    }

    pub fn waste_report(&self, now: DateTime<Utc>) -> ServiceResult<Vec<engine::WasteRow>> {
        let items = self.store.items(ItemFilter::All)?;
        let (counts, production) = self.window_events(now)?;
        let intervals = engine::intervals(&counts, &production);
        Ok(engine::waste_report(&items, &intervals, &production))
    }

    pub fn par_accuracy(&self, now: DateTime<Utc>) -> ServiceResult<Vec<engine::ParAccuracyRow>> {
        let items = self.store.items(ItemFilter::Active)?;
        let policies = self.store.policies()?;
        let (counts, production) = self.window_events(now)?;
        let intervals = engine::intervals(&counts, &production);
        Ok(engine::par_accuracy(&items, &policies, &intervals))
    }

    pub fn popularity(&self, now: DateTime<Utc>) -> ServiceResult<Vec<engine::PopularityRow>> {
        let items = self.store.items(ItemFilter::All)?;
        let (counts, production) = self.window_events(now)?;
        let intervals = engine::intervals(&counts, &production);
        Ok(engine::popularity(&items, &intervals))
    }

    // ----- lifecycle -----

    pub fn at_risk_items(&self, now: DateTime<Utc>) -> ServiceResult<Vec<AtRiskItem>> {
        let items = self.store.items(ItemFilter::Active)?;
        Ok(at_risk(&items, now, &self.config.lifecycle))
    }

    /// Discontinue every specialty item that has gone uncounted past the
    /// threshold. All-or-nothing; returns the retired ids.
    pub fn run_retirement_sweep(&self, now: DateTime<Utc>) -> ServiceResult<Vec<ItemId>> {
        let items = self.store.items(ItemFilter::Active)?;
        let candidates = sweep_candidates(&items, now, &self.config.lifecycle);
        if candidates.is_empty() {
            return Ok(candidates);
        }
        let applied = self.store.apply_discontinuations(&candidates, now)?;
        tracing::info!(applied, "retirement sweep committed");
        Ok(candidates)
    }

    // ----- transcripts -----

    /// Resolve transcribed entries against the active roster.
    pub fn resolve_transcript(&self, entries: &[ParsedEntry]) -> ServiceResult<Resolution> {
        let roster: Vec<(ItemId, String)> = self
            .store
            .items(ItemFilter::Active)?
            .into_iter()
            .map(|it| (it.id, it.name))
            .collect();
        Ok(resolve_entries(entries, &roster))
    }
}
