// Prompts and reply parsing for the budget and assignment suggesters

use crate::assignment::Candidate;
use crate::error::{Result, StudioError};
use crate::estimator::{BudgetProposal, ProjectAttributes};
use crate::utils::extract_json_object;
use schemars::gen::SchemaSettings;

pub const SYSTEM_PROMPT_BUDGET: &str = r#"
You are a financial advisor for an architecture firm. Based on the project details you are given, suggest a realistic budget allocation.

Industry standards for architecture projects:
- Labor: 60-70% of budget
- Materials: 20-30% of budget
- Overhead: 10% of budget

Based on the project details, provide:
1. Total recommended budget (in USD)
2. Budget breakdown for labor, materials, and overhead
3. Brief justification

Respond in JSON format:
{
  "totalBudget": <number>,
  "breakdown": {
    "labor": <number>,
    "materials": <number>,
    "overhead": <number>
  },
  "justification": "<string>"
}
"#;

pub const SYSTEM_PROMPT_ASSIGNMENT: &str = r#"
You are a task assignment expert. Analyze the team members you are given and determine which one should be assigned a new task.

Rules:
1. Choose from candidates who have NOT reached the task limit
2. Prefer members with 2-3 incomplete tasks (moderate workload)
3. Among similar workloads, choose the one with LOWEST incomplete task count
4. Avoid overloading any single person

Respond with ONLY the team member's ID (the 'id' field), nothing else. No explanation, just the ID.
"#;

pub fn budget_prompt(project: &ProjectAttributes) -> String {
    format!(
        "Project Name: {}\nStatus: {}\nNotes: {}\nTeam Size: {} members\nProject Lead Role: {}",
        project.name,
        project
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Planned".to_string()),
        project
            .notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("No additional notes"),
        project.team_size,
        project.lead_role.as_deref().unwrap_or("Not assigned"),
    )
}

pub fn assignment_prompt(candidates: &[Candidate], task_limit: usize) -> Result<String> {
    Ok(format!(
        "Task limit per member: {}\n\nTeam Members:\n{}",
        task_limit,
        serde_json::to_string_pretty(candidates)?
    ))
}

/// Pulls the first JSON object out of a free-form reply.
pub fn parse_budget_reply(raw: &str) -> Result<BudgetProposal> {
    let json = extract_json_object(raw)
        .ok_or_else(|| StudioError::Upstream("Invalid AI response format".into()))?;
    serde_json::from_str(json)
        .map_err(|e| StudioError::Upstream(format!("Budget reply did not parse: {}", e)))
}

/// JSON schema for [`BudgetProposal`] in the inlined OpenAPI flavour the
/// Gemini `responseSchema` field accepts.
pub fn budget_response_schema() -> Result<serde_json::Value> {
    let root = SchemaSettings::openapi3()
        .with(|s| s.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<BudgetProposal>();

    let mut value = serde_json::to_value(root)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("definitions");
        obj.remove("title");
    }
    Ok(value)
}
