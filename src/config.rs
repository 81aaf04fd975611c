use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gemini-3-pro";
pub const DEFAULT_HISTORY_LIMIT: usize = 30;
pub const DEFAULT_TREND_RANGE_DAYS: i64 = 30;
pub const DEFAULT_TASK_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StudioConfig {
    /// Credential for the generative AI collaborator. `None` forces the local path.
    pub gemini_api_key: Option<String>,
    pub model: String,
    /// Snapshots returned by the history query when no limit is given.
    pub history_limit: usize,
    /// Trend window used when no range is given.
    pub trend_range_days: i64,
    /// Hard cap on tasks per team member for automatic assignment.
    pub task_limit: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            trend_range_days: DEFAULT_TREND_RANGE_DAYS,
            task_limit: DEFAULT_TASK_LIMIT,
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.gemini_api_key = lookup("GEMINI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(limit) = parse_var(&lookup, "REVENUE_HISTORY_LIMIT")? {
            config.history_limit = limit;
        }
        if let Some(days) = parse_var(&lookup, "REVENUE_TREND_DAYS")? {
            config.trend_range_days = days;
        }
        if let Some(limit) = parse_var(&lookup, "TASK_LIMIT")? {
            config.task_limit = limit;
        }

        Ok(config)
    }

    pub fn has_ai_credential(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            StudioError::Config(format!("{} must be a number, got '{}'", key, raw))
        }),
    }
}
