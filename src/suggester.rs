//! AI collaborator seam.
//!
//! A [`Suggester`] proposes budgets and picks assignees. The network-backed
//! implementation lives in `llm::gemini` behind the `gemini` feature;
//! [`LocalSuggester`] is deterministic and is what every caller falls back to.

use crate::assignment::{pick_fallback_member, Candidate};
use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use crate::estimator::{fallback_budget, BudgetProposal, ProjectAttributes};
use futures::future::{self, BoxFuture};
use std::sync::Arc;

pub trait Suggester: Send + Sync {
    fn name(&self) -> &str;

    fn suggest_budget<'a>(
        &'a self,
        project: &'a ProjectAttributes,
    ) -> BoxFuture<'a, Result<BudgetProposal>>;

    /// Returns the raw id the collaborator chose. Callers must check it
    /// against `candidates`.
    fn choose_assignee<'a>(&'a self, candidates: &'a [Candidate]) -> BoxFuture<'a, Result<String>>;
}

/// Rule-based suggester with no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSuggester;

impl Suggester for LocalSuggester {
    fn name(&self) -> &str {
        "local"
    }

    fn suggest_budget<'a>(
        &'a self,
        project: &'a ProjectAttributes,
    ) -> BoxFuture<'a, Result<BudgetProposal>> {
        Box::pin(future::ready(Ok(fallback_budget(project.team_size))))
    }

    fn choose_assignee<'a>(&'a self, candidates: &'a [Candidate]) -> BoxFuture<'a, Result<String>> {
        let choice = pick_fallback_member(candidates)
            .map(|c| c.id.to_string())
            .ok_or_else(|| StudioError::Upstream("no candidates to choose from".into()));
        Box::pin(future::ready(choice))
    }
}

/// The network suggester the config asks for, if one can be built.
///
/// Returns `None` without an API key or when the crate was built without the
/// `gemini` feature; callers then stay on the local path.
pub fn suggester_from_config(config: &StudioConfig) -> Option<Arc<dyn Suggester>> {
    #[cfg(feature = "gemini")]
    {
        if let Some(key) = &config.gemini_api_key {
            let client = crate::llm::client::GeminiClient::new(key.clone());
            let suggester = crate::llm::gemini::GeminiSuggester::new(client, config.model.clone())
                .with_task_limit(config.task_limit);
            return Some(Arc::new(suggester));
        }
    }
    #[cfg(not(feature = "gemini"))]
    {
        if config.has_ai_credential() {
            log::warn!("GEMINI_API_KEY is set but the gemini feature is disabled; using local suggestions");
        }
    }
    None
}
