//! Keeps `Project::revenue` equal to the sum of received transaction amounts.
//!
//! Every write to a project's revenue goes through [`TransactionReconciler`],
//! which turns transaction lifecycle transitions into [`RevenueAdjustment`]s.

use crate::error::{Result, StudioError};
use crate::schema::{
    ProjectRef, RecordId, RevenueTransaction, TransactionPatch, TransactionRequest,
    TransactionView,
};
use crate::store::{LedgerStore, RevenueAdjustment};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::HashMap;

pub struct TransactionReconciler<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> TransactionReconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All transactions, newest `date` first, with project display fields.
    pub fn list(&self) -> Result<Vec<TransactionView>> {
        let mut transactions = self.store.transactions()?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date));

        let refs: HashMap<RecordId, ProjectRef> = self
            .store
            .projects()?
            .iter()
            .map(|p| (p.id.clone(), p.reference()))
            .collect();

        Ok(transactions
            .into_iter()
            .map(|t| {
                let project = refs.get(&t.project).cloned();
                TransactionView::new(t, project)
            })
            .collect())
    }

    pub fn create(&self, request: TransactionRequest) -> Result<TransactionView> {
        let new_transaction = request.validate(Utc::now())?;

        if self.store.project(&new_transaction.project)?.is_none() {
            return Err(StudioError::not_found(
                "Project",
                new_transaction.project.to_string(),
            ));
        }

        let saved = self.store.insert_transaction(new_transaction)?;
        info!(
            "Recorded {:?} transaction {} of {:.2} for project {}",
            saved.status, saved.id, saved.amount, saved.project
        );

        if saved.status.is_received() {
            self.adjust(&saved.project, saved.amount).map_err(|e| {
                error!(
                    "Transaction {} saved but revenue increment failed: {}",
                    saved.id, e
                );
                e
            })?;
        }

        self.populate(saved)
    }

    /// Applies `patch` and the revenue change implied by the status transition.
    ///
    /// The delta is computed from the record the store patched, so two
    /// concurrent transitions of one transaction are counted once.
    pub fn update(&self, id: &RecordId, patch: &TransactionPatch) -> Result<TransactionView> {
        patch.validate()?;

        let (before, updated) = self
            .store
            .patch_transaction(id, patch)?
            .ok_or_else(|| StudioError::not_found("Transaction", id.to_string()))?;

        let delta = revenue_delta(&before, patch);
        if delta != 0.0 {
            self.adjust(&before.project, delta).map_err(|e| {
                error!(
                    "Transaction {} saved but revenue adjustment of {:.2} failed: {}",
                    id, delta, e
                );
                e
            })?;
        }

        self.populate(updated)
    }

    /// Removes a transaction, reversing its contribution if it was received.
    pub fn delete(&self, id: &RecordId) -> Result<RevenueTransaction> {
        let removed = self
            .store
            .delete_transaction(id)?
            .ok_or_else(|| StudioError::not_found("Transaction", id.to_string()))?;

        if removed.status.is_received() {
            self.adjust(&removed.project, -removed.amount).map_err(|e| {
                error!(
                    "Transaction {} deleted but revenue reversal failed: {}",
                    removed.id, e
                );
                e
            })?;
        }

        info!("Deleted transaction {}", removed.id);
        Ok(removed)
    }

    /// Recomputes a project's revenue from its ledger and stores it.
    pub fn rebuild_revenue(&self, project: &RecordId) -> Result<f64> {
        let transactions = self.store.transactions_for_project(project)?;
        let revenue = ledger_revenue(&transactions);

        let adjustment = RevenueAdjustment::reset(project.clone(), revenue);
        match self.store.apply_revenue(&adjustment)? {
            Some(p) => {
                info!("Rebuilt revenue for project {}: {:.2}", p.id, revenue);
                Ok(revenue)
            }
            None => Err(StudioError::not_found("Project", project.to_string())),
        }
    }

    fn adjust(&self, project: &RecordId, delta: f64) -> Result<()> {
        debug!("Adjusting revenue of project {} by {:.2}", project, delta);
        let adjustment = RevenueAdjustment::increment(project.clone(), delta);
        if self.store.apply_revenue(&adjustment)?.is_none() {
            warn!(
                "Project {} no longer exists; revenue adjustment of {:.2} dropped",
                project, delta
            );
        }
        Ok(())
    }

    fn populate(&self, transaction: RevenueTransaction) -> Result<TransactionView> {
        let project = self
            .store
            .project(&transaction.project)?
            .map(|p| p.reference());
        Ok(TransactionView::new(transaction, project))
    }
}

/// Revenue change implied by applying `patch` to `current`.
///
/// - entering Received adds the new amount (or the old one if unchanged)
/// - leaving Received removes the old amount
/// - staying Received resyncs by `new - old`
pub fn revenue_delta(current: &RevenueTransaction, patch: &TransactionPatch) -> f64 {
    let was_received = current.status.is_received();
    let will_be_received = patch.status.map_or(was_received, |s| s.is_received());
    let new_amount = patch.amount.unwrap_or(current.amount);

    match (was_received, will_be_received) {
        (false, true) => new_amount,
        (true, false) => -current.amount,
        (true, true) => new_amount - current.amount,
        (false, false) => 0.0,
    }
}

/// Sum of amounts over received transactions.
pub fn ledger_revenue(transactions: &[RevenueTransaction]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.status.is_received())
        .map(|t| t.amount)
        .sum()
}
