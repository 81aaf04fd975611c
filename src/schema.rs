use crate::error::{Result, StudioError};
use chrono::{DateTime, Utc};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_STUDIO: &str = "Core Studio";
pub const DEFAULT_PROJECT_COLOR: &str = "#2563eb";

/// Opaque record identifier (24 lowercase hex characters for generated ids).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let bytes: [u8; 12] = rng.gen();
        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProjectStatus {
    #[default]
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "At Risk")]
    AtRisk,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Planned => "Planned",
            Self::InProgress => "In Progress",
            Self::AtRisk => "At Risk",
            Self::Completed => "Completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Blocked,
    Complete,
}

impl TaskStatus {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TransactionCategory {
    Milestone,
    Retainer,
    #[serde(rename = "Final Payment")]
    FinalPayment,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TransactionStatus {
    #[default]
    Pending,
    /// Payment collected. Only received transactions count toward project revenue.
    Received,
    Overdue,
}

impl TransactionStatus {
    pub fn is_received(self) -> bool {
        self == Self::Received
    }
}

/// Informational split of a project budget. Not required to sum to the budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct BudgetBreakdown {
    #[schemars(description = "Labor cost in USD (typically 60-70% of the budget)")]
    pub labor: f64,
    #[schemars(description = "Materials cost in USD (typically 20-30% of the budget)")]
    pub materials: f64,
    #[schemars(description = "Overhead cost in USD (typically 10% of the budget)")]
    pub overhead: f64,
}

impl BudgetBreakdown {
    pub fn total(&self) -> f64 {
        self.labor + self.materials + self.overhead
    }

    pub fn is_non_negative(&self) -> bool {
        [self.labor, self.materials, self.overhead]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    pub status: ProjectStatus,
    pub progress: u8,
    pub studio: String,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub color: String,
    pub project_lead: Option<RecordId>,
    /// Cached sum of received transaction amounts. Written only through
    /// [`crate::store::RevenueAdjustment`].
    revenue: f64,
    pub budget: f64,
    pub budget_breakdown: BudgetBreakdown,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Materializes a validated request. Revenue always starts at zero.
    pub fn new(id: RecordId, request: NewProject, now: DateTime<Utc>) -> Result<Self> {
        request.validate()?;
        Ok(Self {
            id,
            name: request.name.trim().to_string(),
            status: request.status.unwrap_or_default(),
            progress: request.progress.unwrap_or(0),
            studio: request
                .studio
                .unwrap_or_else(|| DEFAULT_STUDIO.to_string()),
            due_date: request.due_date,
            notes: request.notes.map(|n| n.trim().to_string()),
            color: request
                .color
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            project_lead: request.project_lead,
            revenue: 0.0,
            budget: request.budget.unwrap_or(0.0),
            budget_breakdown: request.budget_breakdown.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn revenue(&self) -> f64 {
        self.revenue
    }

    pub(crate) fn set_revenue(&mut self, revenue: f64) {
        self.revenue = revenue;
    }

    pub fn reference(&self) -> ProjectRef {
        ProjectRef {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub status: Option<ProjectStatus>,
    pub progress: Option<u8>,
    pub studio: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub project_lead: Option<RecordId>,
    pub budget: Option<f64>,
    pub budget_breakdown: Option<BudgetBreakdown>,
}

impl NewProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StudioError::Validation("Project name is required".into()));
        }
        validate_progress(self.progress)?;
        validate_budget(self.budget, self.budget_breakdown.as_ref())
    }
}

/// User-editable project fields. Revenue is deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub progress: Option<u8>,
    pub studio: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub project_lead: Option<RecordId>,
    pub budget: Option<f64>,
    pub budget_breakdown: Option<BudgetBreakdown>,
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project, now: DateTime<Utc>) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(StudioError::Validation("Project name is required".into()));
            }
        }
        validate_progress(self.progress)?;
        validate_budget(self.budget, self.budget_breakdown.as_ref())?;

        if let Some(name) = &self.name {
            project.name = name.trim().to_string();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(progress) = self.progress {
            project.progress = progress;
        }
        if let Some(studio) = &self.studio {
            project.studio = studio.clone();
        }
        if self.due_date.is_some() {
            project.due_date = self.due_date;
        }
        if let Some(notes) = &self.notes {
            project.notes = Some(notes.trim().to_string());
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
        if self.project_lead.is_some() {
            project.project_lead = self.project_lead.clone();
        }
        if let Some(budget) = self.budget {
            project.budget = budget;
        }
        if let Some(breakdown) = self.budget_breakdown {
            project.budget_breakdown = breakdown;
        }
        project.updated_at = now;
        Ok(())
    }
}

fn validate_progress(progress: Option<u8>) -> Result<()> {
    match progress {
        Some(p) if p > 100 => Err(StudioError::Validation(format!(
            "Progress must be between 0 and 100, got {}",
            p
        ))),
        _ => Ok(()),
    }
}

fn validate_budget(budget: Option<f64>, breakdown: Option<&BudgetBreakdown>) -> Result<()> {
    if let Some(b) = budget {
        if !b.is_finite() || b < 0.0 {
            return Err(StudioError::Validation(format!(
                "Budget must be a non-negative number, got {}",
                b
            )));
        }
    }
    if let Some(bd) = breakdown {
        if !bd.is_non_negative() {
            return Err(StudioError::Validation(
                "Budget breakdown values must be non-negative".into(),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    /// Owning project. Tasks without one are ignored by profit analysis.
    pub project: Option<RecordId>,
    /// Cost consumed against the project's budget.
    pub budget: f64,
    pub status: TaskStatus,
    pub role: Option<String>,
    pub assignee: Option<RecordId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub project: Option<RecordId>,
    pub budget: Option<f64>,
    pub status: Option<TaskStatus>,
    pub role: Option<String>,
    pub assignee: Option<RecordId>,
}

impl NewTask {
    pub fn for_project(project: &RecordId, title: impl Into<String>, budget: f64) -> Self {
        Self {
            title: title.into(),
            project: Some(project.clone()),
            budget: Some(budget),
            ..Default::default()
        }
    }

    pub fn into_task(self, id: RecordId, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            project: self.project,
            budget: self.budget.unwrap_or(0.0),
            status: self.status.unwrap_or_default(),
            role: self.role,
            assignee: self.assignee,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: RecordId,
    pub name: String,
    pub role: String,
    pub capacity: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    pub name: String,
    pub role: String,
    pub capacity: Option<u32>,
}

impl NewTeamMember {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            capacity: None,
        }
    }

    pub fn into_member(self, id: RecordId, now: DateTime<Utc>) -> TeamMember {
        TeamMember {
            id,
            name: self.name,
            role: self.role,
            capacity: self.capacity,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTransaction {
    pub id: RecordId,
    pub project: RecordId,
    /// Signed amount.
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: TransactionCategory,
    pub status: TransactionStatus,
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transaction that already passed request validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub project: RecordId,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: TransactionCategory,
    pub status: TransactionStatus,
    pub invoice_id: Option<String>,
}

impl NewTransaction {
    pub fn into_transaction(self, id: RecordId, now: DateTime<Utc>) -> RevenueTransaction {
        RevenueTransaction {
            id,
            project: self.project,
            amount: self.amount,
            date: self.date,
            description: self.description,
            category: self.category,
            status: self.status,
            invoice_id: self.invoice_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw creation payload. Required fields are optional here so a missing
/// value becomes a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub project: Option<RecordId>,
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub category: Option<TransactionCategory>,
    pub status: Option<TransactionStatus>,
    pub invoice_id: Option<String>,
}

impl TransactionRequest {
    pub fn new(project: &RecordId, amount: f64, description: impl Into<String>) -> Self {
        Self {
            project: Some(project.clone()),
            amount: Some(amount),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: TransactionCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Checks required fields and fills defaults (`date` = `now`).
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTransaction> {
        let mut missing = Vec::new();

        let project = self.project.filter(|p| !p.as_str().trim().is_empty());
        if project.is_none() {
            missing.push("project");
        }
        // Zero is rejected alongside a missing amount.
        let amount = self.amount.filter(|a| a.is_finite() && *a != 0.0);
        if amount.is_none() {
            missing.push("amount");
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if description.is_none() {
            missing.push("description");
        }

        match (project, amount, description) {
            (Some(project), Some(amount), Some(description)) => Ok(NewTransaction {
                project,
                amount,
                date: self.date.unwrap_or(now),
                description,
                category: self.category.unwrap_or_default(),
                status: self.status.unwrap_or_default(),
                invoice_id: self.invoice_id,
            }),
            _ => Err(StudioError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Editable transaction fields. The owning project cannot be reassigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub category: Option<TransactionCategory>,
    pub status: Option<TransactionStatus>,
    pub invoice_id: Option<String>,
}

impl TransactionPatch {
    pub fn status(status: TransactionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn amount(amount: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            if !amount.is_finite() {
                return Err(StudioError::Validation("Amount must be a number".into()));
            }
        }
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(StudioError::Validation(
                    "Description cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn apply(&self, transaction: &mut RevenueTransaction, now: DateTime<Utc>) {
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if let Some(date) = self.date {
            transaction.date = date;
        }
        if let Some(description) = &self.description {
            transaction.description = description.trim().to_string();
        }
        if let Some(category) = self.category {
            transaction.category = category;
        }
        if let Some(status) = self.status {
            transaction.status = status;
        }
        if self.invoice_id.is_some() {
            transaction.invoice_id = self.invoice_id.clone();
        }
        transaction.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRevenue {
    pub project: RecordId,
    pub amount: f64,
}

/// Immutable capture of revenue at one instant. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSnapshot {
    pub id: RecordId,
    pub total_revenue: f64,
    pub project_revenues: Vec<ProjectRevenue>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub total_revenue: f64,
    pub project_revenues: Vec<ProjectRevenue>,
}

impl NewSnapshot {
    pub fn into_snapshot(self, id: RecordId, now: DateTime<Utc>) -> RevenueSnapshot {
        RevenueSnapshot {
            id,
            total_revenue: self.total_revenue,
            project_revenues: self.project_revenues,
            created_at: now,
        }
    }
}

/// Display fields of a project, embedded wherever a record references one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: RecordId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: RecordId,
    /// `None` when the project has since been deleted.
    pub project: Option<ProjectRef>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: TransactionCategory,
    pub status: TransactionStatus,
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionView {
    pub fn new(transaction: RevenueTransaction, project: Option<ProjectRef>) -> Self {
        Self {
            id: transaction.id,
            project,
            amount: transaction.amount,
            date: transaction.date,
            description: transaction.description,
            category: transaction.category,
            status: transaction.status,
            invoice_id: transaction.invoice_id,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRevenueView {
    pub project: Option<ProjectRef>,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub id: RecordId,
    pub total_revenue: f64,
    pub project_revenues: Vec<ProjectRevenueView>,
    pub created_at: DateTime<Utc>,
}
