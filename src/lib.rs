//! # Studio Ledger
//!
//! Revenue bookkeeping for a studio project tracker: keeps each project's
//! cached revenue in step with its transaction ledger, derives profit and margin
//! on demand, records revenue snapshots for trend charts, and proposes budgets
//! and task assignees with an optional generative-AI collaborator.
//!
//! ## Core Concepts
//!
//! - **Received**: the transaction status that counts toward project revenue
//! - **Reconciler**: the only writer of `Project::revenue`; every create, update
//!   and delete of a transaction turns into a revenue adjustment
//! - **Margin base**: spent budget when positive, otherwise the total budget
//! - **Snapshot**: append-only capture of total and per-project revenue
//! - **Suggester**: AI collaborator with a deterministic local fallback
//!
//! ## Example
//!
//! ```rust
//! use studio_ledger::*;
//!
//! let store = MemoryStore::new();
//! let project = store
//!     .insert_project(NewProject::named("Harbor Pavilion").with_budget(10_000.0))
//!     .unwrap();
//!
//! let reconciler = TransactionReconciler::new(&store);
//! reconciler
//!     .create(
//!         TransactionRequest::new(&project.id, 6_000.0, "Design milestone")
//!             .with_status(TransactionStatus::Received),
//!     )
//!     .unwrap();
//!
//! store
//!     .insert_task(NewTask::for_project(&project.id, "Schematic design", 4_000.0))
//!     .unwrap();
//!
//! let report = analyze_profit(&store.projects().unwrap(), &store.tasks().unwrap());
//! assert_eq!(report.projects[0].profit, 2_000.0);
//! assert_eq!(report.projects[0].margin, 50.0);
//! ```

pub mod analyzer;
pub mod api;
pub mod assignment;
pub mod config;
pub mod error;
pub mod estimator;
pub mod llm;
pub mod reconciler;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod suggester;
pub mod utils;

pub use analyzer::{
    analyze_profit, revenue_stats, revenue_trends, OverallProfit, ProfitReport, ProjectProfit,
    RevenueStats, TrendPoint,
};
pub use api::{ApiResponse, Method, RevenueApi};
pub use assignment::{AssignmentSelector, Candidate};
pub use config::StudioConfig;
pub use error::{Result, StudioError};
pub use estimator::{
    fallback_budget, BudgetEstimator, BudgetProposal, BudgetSuggestion, ProjectAttributes,
    FALLBACK_JUSTIFICATION,
};
pub use reconciler::{ledger_revenue, TransactionReconciler};
pub use schema::*;
pub use snapshot::SnapshotRecorder;
pub use store::{LedgerStore, MemoryStore, RevenueAdjustment, RevenueOp};
pub use suggester::{suggester_from_config, LocalSuggester, Suggester};

/// Everything a host application needs to serve the revenue endpoints, wired
/// from one config.
pub struct Studio<S: LedgerStore> {
    store: S,
    config: StudioConfig,
    estimator: BudgetEstimator,
}

impl<S: LedgerStore> Studio<S> {
    pub fn new(store: S, config: StudioConfig) -> Self {
        let estimator = BudgetEstimator::from_suggester(suggester_from_config(&config));
        Self {
            store,
            config,
            estimator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn reconciler(&self) -> TransactionReconciler<'_, S> {
        TransactionReconciler::new(&self.store)
    }

    pub fn snapshots(&self) -> SnapshotRecorder<'_, S> {
        SnapshotRecorder::new(&self.store)
    }

    pub fn estimator(&self) -> &BudgetEstimator {
        &self.estimator
    }

    pub fn assignments(&self) -> AssignmentSelector<'_, S> {
        AssignmentSelector::new(&self.store, self.config.task_limit)
            .with_suggester(suggester_from_config(&self.config))
    }

    pub fn api(&self) -> RevenueApi<'_, S> {
        RevenueApi::new(&self.store, &self.config, &self.estimator)
    }
}
