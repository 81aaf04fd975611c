use super::{LedgerStore, RevenueAdjustment};
use crate::error::{Result, StudioError};
use crate::schema::{
    NewProject, NewSnapshot, NewTask, NewTeamMember, NewTransaction, Project, ProjectPatch,
    RecordId, RevenueSnapshot, RevenueTransaction, Task, TeamMember, TransactionPatch,
};
use chrono::Utc;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    members: Vec<TeamMember>,
    transactions: Vec<RevenueTransaction>,
    snapshots: Vec<RevenueSnapshot>,
}

/// In-process store. Revenue increments and transaction patches each run
/// under the write lock, so concurrent writers never lose an update.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an unreachable store: every call fails with a persistence error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.check_online()?;
        self.tables
            .read()
            .map_err(|_| StudioError::Persistence("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.check_online()?;
        self.tables
            .write()
            .map_err(|_| StudioError::Persistence("store lock poisoned".into()))
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StudioError::Persistence("store is offline".into()));
        }
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn insert_project(&self, project: NewProject) -> Result<Project> {
        let project = Project::new(RecordId::generate(), project, Utc::now())?;
        self.write()?.projects.push(project.clone());
        Ok(project)
    }

    fn project(&self, id: &RecordId) -> Result<Option<Project>> {
        Ok(self.read()?.projects.iter().find(|p| &p.id == id).cloned())
    }

    fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.read()?.projects.clone())
    }

    fn update_project(&self, id: &RecordId, patch: &ProjectPatch) -> Result<Option<Project>> {
        let mut tables = self.write()?;
        match tables.projects.iter_mut().find(|p| &p.id == id) {
            Some(project) => {
                patch.apply(project, Utc::now())?;
                Ok(Some(project.clone()))
            }
            None => Ok(None),
        }
    }

    fn delete_project(&self, id: &RecordId) -> Result<Option<Project>> {
        let mut tables = self.write()?;
        let position = tables.projects.iter().position(|p| &p.id == id);
        Ok(position.map(|idx| tables.projects.remove(idx)))
    }

    fn apply_revenue(&self, adjustment: &RevenueAdjustment) -> Result<Option<Project>> {
        let mut tables = self.write()?;
        match tables
            .projects
            .iter_mut()
            .find(|p| &p.id == adjustment.project())
        {
            Some(project) => {
                adjustment.apply_to(project, Utc::now());
                debug!(
                    "Project {} revenue now {:.2} after {:?}",
                    project.id,
                    project.revenue(),
                    adjustment.op()
                );
                Ok(Some(project.clone()))
            }
            None => Ok(None),
        }
    }

    fn insert_task(&self, task: NewTask) -> Result<Task> {
        let task = task.into_task(RecordId::generate(), Utc::now());
        self.write()?.tasks.push(task.clone());
        Ok(task)
    }

    fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self.read()?.tasks.clone())
    }

    fn insert_member(&self, member: NewTeamMember) -> Result<TeamMember> {
        if member.name.trim().is_empty() || member.role.trim().is_empty() {
            return Err(StudioError::Validation(
                "Team member name and role are required".into(),
            ));
        }
        let member = member.into_member(RecordId::generate(), Utc::now());
        self.write()?.members.push(member.clone());
        Ok(member)
    }

    fn members(&self) -> Result<Vec<TeamMember>> {
        Ok(self.read()?.members.clone())
    }

    fn insert_transaction(&self, transaction: NewTransaction) -> Result<RevenueTransaction> {
        let transaction = transaction.into_transaction(RecordId::generate(), Utc::now());
        self.write()?.transactions.push(transaction.clone());
        Ok(transaction)
    }

    fn transaction(&self, id: &RecordId) -> Result<Option<RevenueTransaction>> {
        Ok(self
            .read()?
            .transactions
            .iter()
            .find(|t| &t.id == id)
            .cloned())
    }

    fn transactions(&self) -> Result<Vec<RevenueTransaction>> {
        Ok(self.read()?.transactions.clone())
    }

    fn patch_transaction(
        &self,
        id: &RecordId,
        patch: &TransactionPatch,
    ) -> Result<Option<(RevenueTransaction, RevenueTransaction)>> {
        let mut tables = self.write()?;
        match tables.transactions.iter_mut().find(|t| &t.id == id) {
            Some(transaction) => {
                let before = transaction.clone();
                patch.apply(transaction, Utc::now());
                Ok(Some((before, transaction.clone())))
            }
            None => Ok(None),
        }
    }

    fn delete_transaction(&self, id: &RecordId) -> Result<Option<RevenueTransaction>> {
        let mut tables = self.write()?;
        let position = tables.transactions.iter().position(|t| &t.id == id);
        Ok(position.map(|idx| tables.transactions.remove(idx)))
    }

    fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<RevenueSnapshot> {
        let snapshot = snapshot.into_snapshot(RecordId::generate(), Utc::now());
        self.write()?.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    fn snapshots(&self) -> Result<Vec<RevenueSnapshot>> {
        let mut snapshots = self.read()?.snapshots.clone();
        snapshots.sort_by_key(|s| s.created_at);
        Ok(snapshots)
    }
}
