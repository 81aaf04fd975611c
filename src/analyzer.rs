//! Read-only financial views: profit and margin per project, revenue totals,
//! and revenue trends over stored snapshots. Nothing here writes to the store.

use crate::schema::{BudgetBreakdown, Project, RecordId, RevenueSnapshot, Task};
use crate::utils::{percentage, window_start};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProfit {
    pub project_id: RecordId,
    pub project_name: String,
    pub project_color: String,
    pub revenue: f64,
    pub budget_total: f64,
    pub budget_spent: f64,
    pub budget_remaining: f64,
    pub profit: f64,
    /// Profit as a percentage of the margin base, two decimals.
    pub margin: f64,
    pub budget_breakdown: BudgetBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverallProfit {
    pub total_revenue: f64,
    /// Remaining budget across projects. Kept under this name for older
    /// dashboards; see `total_budget_total` for the authorized total.
    pub total_budget: f64,
    pub total_budget_total: f64,
    pub total_budget_spent: f64,
    pub total_budget_remaining: f64,
    pub total_profit: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfitReport {
    pub overall: OverallProfit,
    pub projects: Vec<ProjectProfit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRevenueStat {
    pub project_id: RecordId,
    pub project_name: String,
    pub project_color: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    pub total_revenue: f64,
    pub project_revenues: Vec<ProjectRevenueStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub revenue: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Task budget consumed per project. Tasks without a project are skipped.
pub fn spent_by_project(tasks: &[Task]) -> HashMap<RecordId, f64> {
    let mut spent: HashMap<RecordId, f64> = HashMap::new();
    for task in tasks {
        if let Some(project) = &task.project {
            *spent.entry(project.clone()).or_insert(0.0) += task.budget;
        }
    }
    spent
}

/// Denominator for margin: spent budget when positive, otherwise the total budget.
pub fn margin_base(spent: f64, budget: f64) -> f64 {
    if spent > 0.0 {
        spent
    } else {
        budget
    }
}

pub fn analyze_profit(projects: &[Project], tasks: &[Task]) -> ProfitReport {
    let spent = spent_by_project(tasks);

    let rows: Vec<ProjectProfit> = projects
        .iter()
        .map(|p| {
            let revenue = p.revenue();
            let budget_spent = spent.get(&p.id).copied().unwrap_or(0.0);
            let budget_remaining = (p.budget - budget_spent).max(0.0);
            let profit = revenue - budget_spent;

            ProjectProfit {
                project_id: p.id.clone(),
                project_name: p.name.clone(),
                project_color: p.color.clone(),
                revenue,
                budget_total: p.budget,
                budget_spent,
                budget_remaining,
                profit,
                margin: percentage(profit, margin_base(budget_spent, p.budget)),
                budget_breakdown: p.budget_breakdown,
            }
        })
        .collect();

    let total_revenue: f64 = rows.iter().map(|r| r.revenue).sum();
    let total_budget_total: f64 = rows.iter().map(|r| r.budget_total).sum();
    let total_budget_spent: f64 = rows.iter().map(|r| r.budget_spent).sum();
    let total_budget_remaining: f64 = rows.iter().map(|r| r.budget_remaining).sum();
    let total_profit = total_revenue - total_budget_spent;

    ProfitReport {
        overall: OverallProfit {
            total_revenue,
            total_budget: total_budget_remaining,
            total_budget_total,
            total_budget_spent,
            total_budget_remaining,
            total_profit,
            margin: percentage(
                total_profit,
                margin_base(total_budget_spent, total_budget_total),
            ),
        },
        projects: rows,
    }
}

pub fn revenue_stats(projects: &[Project]) -> RevenueStats {
    RevenueStats {
        total_revenue: projects.iter().map(|p| p.revenue()).sum(),
        project_revenues: projects
            .iter()
            .map(|p| ProjectRevenueStat {
                project_id: p.id.clone(),
                project_name: p.name.clone(),
                project_color: p.color.clone(),
                amount: p.revenue(),
            })
            .collect(),
    }
}

/// Snapshots taken at or after `now - window_days`, oldest first.
pub fn revenue_trends(
    snapshots: &[RevenueSnapshot],
    window_days: i64,
    now: DateTime<Utc>,
) -> Vec<TrendPoint> {
    let since = window_start(now, window_days);
    let mut recent: Vec<&RevenueSnapshot> = snapshots
        .iter()
        .filter(|s| s.created_at >= since)
        .collect();
    recent.sort_by_key(|s| s.created_at);

    recent
        .into_iter()
        .map(|s| TrendPoint {
            date: s.created_at,
            revenue: s.total_revenue,
            timestamp: s.created_at.timestamp_millis(),
        })
        .collect()
}
