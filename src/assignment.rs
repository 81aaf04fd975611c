use crate::error::Result;
use crate::schema::{RecordId, Task, TeamMember};
use crate::store::LedgerStore;
use crate::suggester::Suggester;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Members holding at least this many unfinished tasks, and at most
/// `MODERATE_LOAD_MAX`, are preferred.
pub const MODERATE_LOAD_MIN: usize = 2;
pub const MODERATE_LOAD_MAX: usize = 3;

/// A team member together with their current workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: RecordId,
    pub name: String,
    pub role: String,
    pub capacity: Option<u32>,
    pub total_tasks: usize,
    pub incomplete_tasks: usize,
    pub completed_tasks: usize,
}

pub fn workloads(members: &[TeamMember], tasks: &[Task]) -> Vec<Candidate> {
    members
        .iter()
        .map(|m| {
            let assigned: Vec<&Task> = tasks
                .iter()
                .filter(|t| t.assignee.as_ref() == Some(&m.id))
                .collect();
            let total_tasks = assigned.len();
            let incomplete_tasks = assigned.iter().filter(|t| !t.status.is_complete()).count();

            Candidate {
                id: m.id.clone(),
                name: m.name.clone(),
                role: m.role.clone(),
                capacity: m.capacity,
                total_tasks,
                incomplete_tasks,
                completed_tasks: total_tasks - incomplete_tasks,
            }
        })
        .collect()
}

/// Drops members at `task_limit`, then narrows to the moderate-load band when
/// anyone falls in it.
pub fn candidate_pool(candidates: Vec<Candidate>, task_limit: usize) -> Vec<Candidate> {
    let eligible: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.total_tasks < task_limit)
        .collect();

    let moderate: Vec<Candidate> = eligible
        .iter()
        .filter(|c| (MODERATE_LOAD_MIN..=MODERATE_LOAD_MAX).contains(&c.incomplete_tasks))
        .cloned()
        .collect();

    if moderate.is_empty() {
        eligible
    } else {
        moderate
    }
}

/// Fewest unfinished tasks wins, then fewest tasks overall, then pool order.
pub fn pick_fallback_member(pool: &[Candidate]) -> Option<&Candidate> {
    pool.iter()
        .min_by_key(|c| (c.incomplete_tasks, c.total_tasks))
}

pub struct AssignmentSelector<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
    suggester: Option<Arc<dyn Suggester>>,
    task_limit: usize,
}

impl<'a, S: LedgerStore + ?Sized> AssignmentSelector<'a, S> {
    pub fn new(store: &'a S, task_limit: usize) -> Self {
        Self {
            store,
            suggester: None,
            task_limit,
        }
    }

    pub fn with_suggester(mut self, suggester: Option<Arc<dyn Suggester>>) -> Self {
        self.suggester = suggester;
        self
    }

    /// Picks the member who should take a new task for `role`.
    ///
    /// `Ok(None)` when no role is given, nobody holds it, or everyone is at
    /// the task limit. Suggester failures never surface.
    pub async fn assign(&self, role: Option<&str>) -> Result<Option<RecordId>> {
        let role = match role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(role) => role,
            None => return Ok(None),
        };

        let members = self.store.members_with_role(role)?;
        if members.is_empty() {
            return Ok(None);
        }

        let tasks = self.store.tasks()?;
        let pool = candidate_pool(workloads(&members, &tasks), self.task_limit);
        if pool.is_empty() {
            info!(
                "All '{}' members are at the task limit ({})",
                role, self.task_limit
            );
            return Ok(None);
        }

        if let Some(suggester) = &self.suggester {
            match suggester.choose_assignee(&pool).await {
                Ok(raw) => {
                    let chosen = raw.trim();
                    if let Some(member) = pool.iter().find(|c| c.id.as_str() == chosen) {
                        self.log_choice(suggester.name(), member);
                        return Ok(Some(member.id.clone()));
                    }
                    warn!(
                        "{} chose '{}' which is not a candidate; using fallback",
                        suggester.name(),
                        chosen
                    );
                }
                Err(e) => warn!("{} assignment failed, using fallback: {}", suggester.name(), e),
            }
        }

        Ok(pick_fallback_member(&pool).map(|member| {
            self.log_choice("fallback", member);
            member.id.clone()
        }))
    }

    fn log_choice(&self, source: &str, member: &Candidate) {
        info!(
            "[{}] Task assigned to {} (Incomplete: {}, Total: {}/{})",
            source, member.name, member.incomplete_tasks, member.total_tasks, self.task_limit
        );
    }
}
