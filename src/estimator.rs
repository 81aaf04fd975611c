use crate::error::{Result, StudioError};
use crate::schema::{BudgetBreakdown, ProjectStatus};
use crate::suggester::Suggester;
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_TEAM_SIZE: u32 = 5;
pub const AVG_MONTHLY_SALARY_PER_MEMBER: f64 = 8_000.0;
pub const DEFAULT_DURATION_MONTHS: f64 = 3.0;
pub const LABOR_SHARE: f64 = 0.65;
pub const MATERIALS_SHARE: f64 = 0.25;
pub const OVERHEAD_SHARE: f64 = 0.10;
pub const FALLBACK_JUSTIFICATION: &str = "AI unavailable. Using standard industry estimates.";

fn default_team_size() -> u32 {
    DEFAULT_TEAM_SIZE
}

/// Sparse project description sent to the estimator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAttributes {
    pub name: String,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_team_size")]
    pub team_size: u32,
    #[serde(default)]
    pub lead_role: Option<String>,
}

impl ProjectAttributes {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: None,
            notes: None,
            team_size: DEFAULT_TEAM_SIZE,
            lead_role: None,
        }
    }

    pub fn with_team_size(mut self, team_size: u32) -> Self {
        self.team_size = team_size;
        self
    }
}

/// Budget as proposed by a suggester, before the contract checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProposal {
    #[schemars(description = "Total recommended budget in USD")]
    pub total_budget: f64,
    pub breakdown: BudgetBreakdown,
    #[serde(default)]
    #[schemars(description = "Brief justification for the allocation")]
    pub justification: String,
}

/// Result handed back to callers. `success` is false whenever the local
/// fallback produced the numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSuggestion {
    pub success: bool,
    pub total_budget: f64,
    pub breakdown: BudgetBreakdown,
    pub justification: String,
}

/// Industry-standard split: labor covers a team for three months at 65% of the
/// total, materials 25%, overhead 10%. The total is the sum of the rounded parts.
pub fn fallback_budget(team_size: u32) -> BudgetProposal {
    let labor_cost = f64::from(team_size) * AVG_MONTHLY_SALARY_PER_MEMBER * DEFAULT_DURATION_MONTHS;
    let total = labor_cost / LABOR_SHARE;

    let breakdown = BudgetBreakdown {
        labor: (total * LABOR_SHARE).round(),
        materials: (total * MATERIALS_SHARE).round(),
        overhead: (total * OVERHEAD_SHARE).round(),
    };

    BudgetProposal {
        total_budget: breakdown.total(),
        breakdown,
        justification: String::new(),
    }
}

/// Rejects proposals that break the breakdown contract and pins the total to
/// the sum of the parts.
pub fn normalize_proposal(proposal: BudgetProposal) -> Result<BudgetProposal> {
    if !proposal.breakdown.is_non_negative() {
        return Err(StudioError::Upstream(format!(
            "breakdown has negative or non-finite values: {:?}",
            proposal.breakdown
        )));
    }
    let total = proposal.breakdown.total();
    if total <= 0.0 {
        return Err(StudioError::Upstream("breakdown sums to zero".into()));
    }
    if (total - proposal.total_budget).abs() > 0.5 {
        warn!(
            "Suggested total {:.2} does not match breakdown sum {:.2}; using the sum",
            proposal.total_budget, total
        );
    }
    Ok(BudgetProposal {
        total_budget: total,
        ..proposal
    })
}

pub struct BudgetEstimator {
    primary: Option<Arc<dyn Suggester>>,
}

impl BudgetEstimator {
    /// Estimator that only ever uses the local rules.
    pub fn local() -> Self {
        Self { primary: None }
    }

    pub fn with_suggester(suggester: Arc<dyn Suggester>) -> Self {
        Self {
            primary: Some(suggester),
        }
    }

    pub fn from_suggester(suggester: Option<Arc<dyn Suggester>>) -> Self {
        Self { primary: suggester }
    }

    /// Never fails: any primary-path error turns into the local estimate.
    pub async fn suggest(&self, project: &ProjectAttributes) -> BudgetSuggestion {
        if let Some(primary) = &self.primary {
            match primary
                .suggest_budget(project)
                .await
                .and_then(normalize_proposal)
            {
                Ok(proposal) => {
                    info!(
                        "Budget suggestion from {} for '{}': {:.2}",
                        primary.name(),
                        project.name,
                        proposal.total_budget
                    );
                    return BudgetSuggestion {
                        success: true,
                        total_budget: proposal.total_budget,
                        breakdown: proposal.breakdown,
                        justification: proposal.justification,
                    };
                }
                Err(e) => warn!(
                    "Budget suggestion from {} failed, using fallback: {}",
                    primary.name(),
                    e
                ),
            }
        }

        let fallback = fallback_budget(project.team_size);
        BudgetSuggestion {
            success: false,
            total_budget: fallback.total_budget,
            breakdown: fallback.breakdown,
            justification: FALLBACK_JUSTIFICATION.to_string(),
        }
    }
}
