//! Persistence seam. The crate only talks to storage through [`LedgerStore`];
//! [`MemoryStore`] is the in-process implementation used by tests and demos.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::schema::{
    NewProject, NewSnapshot, NewTask, NewTeamMember, NewTransaction, Project, ProjectPatch,
    RecordId, RevenueSnapshot, RevenueTransaction, Task, TeamMember, TransactionPatch,
};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevenueOp {
    /// Add a signed delta to the cached revenue.
    Increment(f64),
    /// Overwrite the cached revenue with a recomputed ledger sum.
    Reset(f64),
}

/// The only handle that can change `Project::revenue`.
///
/// Values are minted by the transaction reconciler; code outside this crate can
/// inspect and apply them but never construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueAdjustment {
    project: RecordId,
    op: RevenueOp,
}

impl RevenueAdjustment {
    pub(crate) fn increment(project: RecordId, delta: f64) -> Self {
        Self {
            project,
            op: RevenueOp::Increment(delta),
        }
    }

    pub(crate) fn reset(project: RecordId, revenue: f64) -> Self {
        Self {
            project,
            op: RevenueOp::Reset(revenue),
        }
    }

    pub fn project(&self) -> &RecordId {
        &self.project
    }

    pub fn op(&self) -> RevenueOp {
        self.op
    }

    pub fn apply_to(&self, project: &mut Project, now: DateTime<Utc>) {
        let revenue = match self.op {
            RevenueOp::Increment(delta) => project.revenue() + delta,
            RevenueOp::Reset(value) => value,
        };
        project.set_revenue(revenue);
        project.updated_at = now;
    }
}

/// Document-store contract. Every call is a single atomic step from the
/// caller's point of view; nothing spans calls.
pub trait LedgerStore: Send + Sync {
    fn insert_project(&self, project: NewProject) -> Result<Project>;
    fn project(&self, id: &RecordId) -> Result<Option<Project>>;
    /// All projects in insertion order.
    fn projects(&self) -> Result<Vec<Project>>;
    fn update_project(&self, id: &RecordId, patch: &ProjectPatch) -> Result<Option<Project>>;
    /// Does not cascade to transactions or tasks.
    fn delete_project(&self, id: &RecordId) -> Result<Option<Project>>;
    /// Applies the adjustment atomically. Returns `None` when the project is gone.
    fn apply_revenue(&self, adjustment: &RevenueAdjustment) -> Result<Option<Project>>;

    fn insert_task(&self, task: NewTask) -> Result<Task>;
    fn tasks(&self) -> Result<Vec<Task>>;

    fn insert_member(&self, member: NewTeamMember) -> Result<TeamMember>;
    fn members(&self) -> Result<Vec<TeamMember>>;

    fn insert_transaction(&self, transaction: NewTransaction) -> Result<RevenueTransaction>;
    fn transaction(&self, id: &RecordId) -> Result<Option<RevenueTransaction>>;
    fn transactions(&self) -> Result<Vec<RevenueTransaction>>;
    /// Applies `patch` and returns the record as it was before and after, read
    /// and written in one step. Revenue deltas must be derived from this
    /// `before`, never from an earlier read.
    fn patch_transaction(
        &self,
        id: &RecordId,
        patch: &TransactionPatch,
    ) -> Result<Option<(RevenueTransaction, RevenueTransaction)>>;
    fn delete_transaction(&self, id: &RecordId) -> Result<Option<RevenueTransaction>>;

    fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<RevenueSnapshot>;
    /// All snapshots, oldest first.
    fn snapshots(&self) -> Result<Vec<RevenueSnapshot>>;

    fn members_with_role(&self, role: &str) -> Result<Vec<TeamMember>> {
        Ok(self
            .members()?
            .into_iter()
            .filter(|m| m.role == role)
            .collect())
    }

    fn transactions_for_project(&self, project: &RecordId) -> Result<Vec<RevenueTransaction>> {
        Ok(self
            .transactions()?
            .into_iter()
            .filter(|t| &t.project == project)
            .collect())
    }

    /// The newest `limit` snapshots, oldest first.
    fn latest_snapshots(&self, limit: usize) -> Result<Vec<RevenueSnapshot>> {
        let mut all = self.snapshots()?;
        let skip = all.len().saturating_sub(limit);
        Ok(all.split_off(skip))
    }

    fn snapshots_since(&self, since: DateTime<Utc>) -> Result<Vec<RevenueSnapshot>> {
        Ok(self
            .snapshots()?
            .into_iter()
            .filter(|s| s.created_at >= since)
            .collect())
    }
}
