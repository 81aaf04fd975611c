use crate::analyzer::{revenue_trends, TrendPoint};
use crate::error::Result;
use crate::schema::{
    NewSnapshot, Project, ProjectRef, ProjectRevenue, ProjectRevenueView, RecordId,
    RevenueSnapshot, SnapshotView,
};
use crate::store::LedgerStore;
use crate::utils::window_start;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashMap;

/// Appends revenue snapshots and answers history and trend queries over them.
pub struct SnapshotRecorder<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LedgerStore + ?Sized> SnapshotRecorder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Captures current revenue. Repeated calls are not deduplicated.
    pub fn record(&self) -> Result<SnapshotView> {
        let projects = self.store.projects()?;
        let snapshot = self.store.append_snapshot(capture(&projects))?;
        info!(
            "Recorded revenue snapshot {} (total {:.2}, {} projects)",
            snapshot.id,
            snapshot.total_revenue,
            snapshot.project_revenues.len()
        );
        Ok(populate(snapshot, &project_refs(&projects)))
    }

    /// The newest `limit` snapshots, oldest first.
    pub fn history(&self, limit: usize) -> Result<Vec<SnapshotView>> {
        let snapshots = self.store.latest_snapshots(limit)?;
        let refs = project_refs(&self.store.projects()?);
        Ok(snapshots.into_iter().map(|s| populate(s, &refs)).collect())
    }

    pub fn trends(&self, window_days: i64, now: DateTime<Utc>) -> Result<Vec<TrendPoint>> {
        let since = window_start(now, window_days);
        let snapshots = self.store.snapshots_since(since)?;
        Ok(revenue_trends(&snapshots, window_days, now))
    }
}

/// Builds the snapshot payload. Projects without positive revenue are left
/// out of the breakdown but still summed into the total.
pub fn capture(projects: &[Project]) -> NewSnapshot {
    NewSnapshot {
        total_revenue: projects.iter().map(|p| p.revenue()).sum(),
        project_revenues: projects
            .iter()
            .filter(|p| p.revenue() > 0.0)
            .map(|p| ProjectRevenue {
                project: p.id.clone(),
                amount: p.revenue(),
            })
            .collect(),
    }
}

fn project_refs(projects: &[Project]) -> HashMap<RecordId, ProjectRef> {
    projects
        .iter()
        .map(|p| (p.id.clone(), p.reference()))
        .collect()
}

fn populate(snapshot: RevenueSnapshot, refs: &HashMap<RecordId, ProjectRef>) -> SnapshotView {
    SnapshotView {
        id: snapshot.id,
        total_revenue: snapshot.total_revenue,
        project_revenues: snapshot
            .project_revenues
            .into_iter()
            .map(|pr| ProjectRevenueView {
                project: refs.get(&pr.project).cloned(),
                amount: pr.amount,
            })
            .collect(),
        created_at: snapshot.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NewProject;

    fn project(name: &str, revenue: f64) -> Project {
        let mut p = Project::new(RecordId::generate(), NewProject::named(name), Utc::now()).unwrap();
        p.set_revenue(revenue);
        p
    }

    #[test]
    fn test_capture_skips_zero_revenue_projects() {
        let projects = vec![project("A", 1_000.0), project("B", 0.0), project("C", 250.0)];
        let snapshot = capture(&projects);
        assert_eq!(snapshot.total_revenue, 1_250.0);
        assert_eq!(snapshot.project_revenues.len(), 2);
        assert!(snapshot
            .project_revenues
            .iter()
            .all(|pr| pr.project != projects[1].id));
    }

    #[test]
    fn test_capture_negative_revenue_counts_in_total_only() {
        let snapshot = capture(&[project("A", 500.0), project("Refunds", -200.0)]);
        assert_eq!(snapshot.total_revenue, 300.0);
        assert_eq!(snapshot.project_revenues.len(), 1);
    }

    #[test]
    fn test_populate_resolves_deleted_projects_to_none() {
        let kept = project("Kept", 10.0);
        let refs = project_refs(std::slice::from_ref(&kept));
        let snapshot = RevenueSnapshot {
            id: RecordId::generate(),
            total_revenue: 30.0,
            project_revenues: vec![
                ProjectRevenue {
                    project: kept.id.clone(),
                    amount: 10.0,
                },
                ProjectRevenue {
                    project: RecordId::from("gone"),
                    amount: 20.0,
                },
            ],
            created_at: Utc::now(),
        };
        let view = populate(snapshot, &refs);
        assert_eq!(view.project_revenues[0].project.as_ref().unwrap().name, "Kept");
        assert!(view.project_revenues[1].project.is_none());
    }
}
