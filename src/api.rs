//! HTTP-style surface over the revenue core.
//!
//! [`RevenueApi`] maps a method, path, query string and JSON body to an
//! [`ApiResponse`] without tying the crate to a web framework. Mount it behind
//! whatever server the host application uses.

use crate::analyzer::{analyze_profit, revenue_stats};
use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use crate::estimator::{BudgetEstimator, ProjectAttributes};
use crate::reconciler::TransactionReconciler;
use crate::schema::{RecordId, TransactionPatch, TransactionRequest};
use crate::snapshot::SnapshotRecorder;
use crate::store::LedgerStore;
use crate::utils::parse_positive_or;
use chrono::Utc;
use log::error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self::message(500, "Failed to serialize response")
            }
        }
    }

    fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    /// Maps an error to its response. `context` is the message used for
    /// validation and server failures.
    fn from_error(err: &StudioError, context: &str) -> Self {
        match err {
            StudioError::NotFound { entity, .. } => {
                Self::message(404, &format!("{} not found", entity))
            }
            e if e.status_code() == 400 => Self {
                status: 400,
                body: json!({ "message": context, "error": e.to_string() }),
            },
            e => {
                error!("{}: {}", context, e);
                Self::message(500, context)
            }
        }
    }

    fn from_result<T: Serialize>(result: Result<T>, status: u16, context: &str) -> Self {
        match result {
            Ok(value) => Self::json(status, &value),
            Err(e) => Self::from_error(&e, context),
        }
    }
}

pub struct RevenueApi<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
    config: &'a StudioConfig,
    estimator: &'a BudgetEstimator,
}

impl<'a, S: LedgerStore + ?Sized> RevenueApi<'a, S> {
    pub fn new(store: &'a S, config: &'a StudioConfig, estimator: &'a BudgetEstimator) -> Self {
        Self {
            store,
            config,
            estimator,
        }
    }

    /// Routes a request. `path` may carry a leading `/` or `/api/` prefix.
    pub async fn handle(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
    ) -> ApiResponse {
        let path = path.trim_start_matches('/');
        let path = path.strip_prefix("api/").unwrap_or(path);
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (Method::Get, ["revenue", "stats"]) => self.stats(),
            (Method::Get, ["revenue", "history"]) => self.history(query_param(query, "limit")),
            (Method::Post, ["revenue", "snapshot"]) => self.snapshot(),
            (Method::Get, ["revenue", "profit"]) => self.profit(),
            (Method::Get, ["revenue", "trends"]) => self.trends(query_param(query, "range")),
            (Method::Get, ["revenue-transactions"]) => self.list_transactions(),
            (Method::Post, ["revenue-transactions"]) => self.create_transaction(body),
            (Method::Put, ["revenue-transactions", id]) => self.update_transaction(id, body),
            (Method::Delete, ["revenue-transactions", id]) => self.delete_transaction(id),
            (Method::Post, ["budget", "suggest"]) => self.suggest_budget(body).await,
            _ => ApiResponse::message(404, "Route not found"),
        }
    }

    pub fn stats(&self) -> ApiResponse {
        let result = self.store.projects().map(|p| revenue_stats(&p));
        ApiResponse::from_result(result, 200, "Failed to fetch revenue stats")
    }

    pub fn history(&self, limit: Option<String>) -> ApiResponse {
        let limit = parse_positive_or(limit.as_deref(), self.config.history_limit);
        let result = SnapshotRecorder::new(self.store).history(limit);
        ApiResponse::from_result(result, 200, "Failed to fetch revenue history")
    }

    pub fn snapshot(&self) -> ApiResponse {
        let result = SnapshotRecorder::new(self.store).record();
        ApiResponse::from_result(result, 201, "Failed to create revenue snapshot")
    }

    pub fn profit(&self) -> ApiResponse {
        let result = self
            .store
            .projects()
            .and_then(|projects| Ok(analyze_profit(&projects, &self.store.tasks()?)));
        ApiResponse::from_result(result, 200, "Failed to fetch profit analysis")
    }

    pub fn trends(&self, range: Option<String>) -> ApiResponse {
        let fallback = usize::try_from(self.config.trend_range_days.max(1)).unwrap_or(1);
        let days = parse_positive_or(range.as_deref(), fallback);
        let days = i64::try_from(days).unwrap_or(i64::MAX);
        let result = SnapshotRecorder::new(self.store).trends(days, Utc::now());
        ApiResponse::from_result(result, 200, "Failed to fetch revenue trends")
    }

    pub fn list_transactions(&self) -> ApiResponse {
        let result = TransactionReconciler::new(self.store).list();
        ApiResponse::from_result(result, 200, "Failed to fetch revenue transactions")
    }

    pub fn create_transaction(&self, body: Option<&Value>) -> ApiResponse {
        let result = parse_body::<TransactionRequest>(body)
            .and_then(|request| TransactionReconciler::new(self.store).create(request));
        ApiResponse::from_result(result, 201, "Failed to create revenue transaction")
    }

    pub fn update_transaction(&self, id: &str, body: Option<&Value>) -> ApiResponse {
        let id = RecordId::from(id);
        let result = parse_body::<TransactionPatch>(body)
            .and_then(|patch| TransactionReconciler::new(self.store).update(&id, &patch));
        ApiResponse::from_result(result, 200, "Failed to update revenue transaction")
    }

    pub fn delete_transaction(&self, id: &str) -> ApiResponse {
        match TransactionReconciler::new(self.store).delete(&RecordId::from(id)) {
            Ok(_) => ApiResponse::message(200, "Transaction deleted"),
            Err(e) => ApiResponse::from_error(&e, "Failed to delete revenue transaction"),
        }
    }

    pub async fn suggest_budget(&self, body: Option<&Value>) -> ApiResponse {
        match parse_body::<ProjectAttributes>(body) {
            Ok(attrs) => ApiResponse::json(200, &self.estimator.suggest(&attrs).await),
            Err(e) => ApiResponse::from_error(&e, "Failed to suggest budget"),
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: Option<&Value>) -> Result<T> {
    let value = body.cloned().unwrap_or_else(|| json!({}));
    Ok(serde_json::from_value(value)?)
}

/// Value of `key` in a raw query string, percent-decoded. `+` reads as a space.
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let raw = query?
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.replace('+', " "))?;
    urlencoding::decode(&raw).ok().map(|v| v.into_owned())
}
