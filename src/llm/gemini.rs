use crate::assignment::Candidate;
use crate::config::DEFAULT_TASK_LIMIT;
use crate::error::Result;
use crate::estimator::{BudgetProposal, ProjectAttributes};
use crate::llm::client::GeminiClient;
use crate::llm::prompts::{
    assignment_prompt, budget_prompt, budget_response_schema, parse_budget_reply,
    SYSTEM_PROMPT_ASSIGNMENT, SYSTEM_PROMPT_BUDGET,
};
use crate::llm::types::Content;
use crate::suggester::Suggester;
use futures::future::BoxFuture;
use log::debug;

/// Suggester backed by Gemini `generateContent`.
pub struct GeminiSuggester {
    client: GeminiClient,
    model: String,
    task_limit: usize,
}

impl GeminiSuggester {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            task_limit: DEFAULT_TASK_LIMIT,
        }
    }

    pub fn with_task_limit(mut self, task_limit: usize) -> Self {
        self.task_limit = task_limit;
        self
    }

    async fn budget(&self, project: &ProjectAttributes) -> Result<BudgetProposal> {
        let raw = self
            .client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT_BUDGET,
                vec![Content::user(budget_prompt(project))],
                Some(budget_response_schema()?),
                "application/json",
            )
            .await?;
        debug!("Gemini budget reply: {}", raw);
        parse_budget_reply(&raw)
    }

    async fn assignee(&self, candidates: &[Candidate]) -> Result<String> {
        let raw = self
            .client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT_ASSIGNMENT,
                vec![Content::user(assignment_prompt(candidates, self.task_limit)?)],
                None,
                "text/plain",
            )
            .await?;
        Ok(raw.trim().to_string())
    }
}

impl Suggester for GeminiSuggester {
    fn name(&self) -> &str {
        "gemini"
    }

    fn suggest_budget<'a>(
        &'a self,
        project: &'a ProjectAttributes,
    ) -> BoxFuture<'a, Result<BudgetProposal>> {
        Box::pin(self.budget(project))
    }

    fn choose_assignee<'a>(&'a self, candidates: &'a [Candidate]) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.assignee(candidates))
    }
}
