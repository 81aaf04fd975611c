use futures::future::{self, BoxFuture};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::sync::Arc;
use studio_ledger::*;

fn project_with_budget(store: &MemoryStore, name: &str, budget: f64) -> Project {
    store
        .insert_project(NewProject::named(name).with_budget(budget))
        .unwrap()
}

fn revenue_of(store: &MemoryStore, id: &RecordId) -> f64 {
    store.project(id).unwrap().unwrap().revenue()
}

fn received(project: &Project, amount: f64) -> TransactionRequest {
    TransactionRequest::new(&project.id, amount, "Milestone payment")
        .with_status(TransactionStatus::Received)
}

fn assert_ledger_matches(store: &MemoryStore, project: &RecordId) {
    let ledger = ledger_revenue(&store.transactions_for_project(project).unwrap());
    let cached = revenue_of(store, project);
    assert!(
        (ledger - cached).abs() < 1e-6,
        "cached revenue {} drifted from ledger {}",
        cached,
        ledger
    );
}

#[test]
fn test_create_received_increments_revenue() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Gallery", 10_000.0);
    let reconciler = TransactionReconciler::new(&store);

    let view = reconciler.create(received(&project, 2_500.0)).unwrap();
    assert_eq!(revenue_of(&store, &project.id), 2_500.0);

    let populated = view.project.unwrap();
    assert_eq!(populated.name, "Gallery");
    assert_eq!(populated.color, DEFAULT_PROJECT_COLOR);
}

#[test]
fn test_create_pending_leaves_revenue() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Gallery", 0.0);
    let reconciler = TransactionReconciler::new(&store);

    reconciler
        .create(TransactionRequest::new(&project.id, 900.0, "Retainer"))
        .unwrap();
    reconciler
        .create(
            TransactionRequest::new(&project.id, 300.0, "Late invoice")
                .with_status(TransactionStatus::Overdue),
        )
        .unwrap();

    assert_eq!(revenue_of(&store, &project.id), 0.0);
}

#[test]
fn test_create_validation_and_unknown_project() {
    let store = MemoryStore::new();
    let reconciler = TransactionReconciler::new(&store);

    let err = reconciler
        .create(TransactionRequest {
            amount: Some(10.0),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, StudioError::Validation(_)));

    let ghost = RecordId::from("000000000000000000000000");
    let err = reconciler
        .create(TransactionRequest::new(&ghost, 10.0, "Deposit"))
        .unwrap_err();
    assert!(matches!(err, StudioError::NotFound { .. }));
    assert!(store.transactions().unwrap().is_empty());
}

#[test]
fn test_unreceiving_reverses_original_amount() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Library", 0.0);
    let reconciler = TransactionReconciler::new(&store);

    reconciler.create(received(&project, 700.0)).unwrap();
    let tx = reconciler.create(received(&project, 1_000.0)).unwrap();
    assert_eq!(revenue_of(&store, &project.id), 1_700.0);

    let patch = TransactionPatch::status(TransactionStatus::Pending).with_amount(5_000.0);
    let updated = reconciler.update(&tx.id, &patch).unwrap();

    assert_eq!(updated.amount, 5_000.0);
    assert_eq!(updated.status, TransactionStatus::Pending);
    assert_eq!(revenue_of(&store, &project.id), 700.0);
    assert_ledger_matches(&store, &project.id);
}

#[test]
fn test_receiving_uses_patched_amount() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Library", 0.0);
    let reconciler = TransactionReconciler::new(&store);

    let tx = reconciler
        .create(TransactionRequest::new(&project.id, 1_000.0, "Final payment"))
        .unwrap();
    let patch = TransactionPatch::status(TransactionStatus::Received).with_amount(1_250.0);
    reconciler.update(&tx.id, &patch).unwrap();

    assert_eq!(revenue_of(&store, &project.id), 1_250.0);
    assert_ledger_matches(&store, &project.id);
}

#[test]
fn test_amount_edit_on_received_resyncs_revenue() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Library", 0.0);
    let reconciler = TransactionReconciler::new(&store);

    let tx = reconciler.create(received(&project, 1_000.0)).unwrap();
    reconciler
        .update(&tx.id, &TransactionPatch::amount(1_400.0))
        .unwrap();

    assert_eq!(revenue_of(&store, &project.id), 1_400.0);
    assert_ledger_matches(&store, &project.id);
}

#[test]
fn test_update_missing_transaction_is_not_found() {
    let store = MemoryStore::new();
    let err = TransactionReconciler::new(&store)
        .update(
            &RecordId::from("missing"),
            &TransactionPatch::status(TransactionStatus::Received),
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_delete_reverses_only_received() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Studio", 0.0);
    let reconciler = TransactionReconciler::new(&store);

    let paid = reconciler.create(received(&project, 800.0)).unwrap();
    let pending = reconciler
        .create(TransactionRequest::new(&project.id, 200.0, "Retainer"))
        .unwrap();
    let overdue = reconciler
        .create(
            TransactionRequest::new(&project.id, 50.0, "Expenses")
                .with_status(TransactionStatus::Overdue),
        )
        .unwrap();
    assert_eq!(revenue_of(&store, &project.id), 800.0);

    reconciler.delete(&pending.id).unwrap();
    reconciler.delete(&overdue.id).unwrap();
    assert_eq!(revenue_of(&store, &project.id), 800.0);

    reconciler.delete(&paid.id).unwrap();
    assert_eq!(revenue_of(&store, &project.id), 0.0);

    let err = reconciler.delete(&paid.id).unwrap_err();
    assert!(matches!(err, StudioError::NotFound { .. }));
}

#[test]
fn test_random_sequences_keep_revenue_equal_to_ledger() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let store = MemoryStore::new();
        let project = project_with_budget(&store, "Randomized", 50_000.0);
        let reconciler = TransactionReconciler::new(&store);
        let statuses = [
            TransactionStatus::Pending,
            TransactionStatus::Received,
            TransactionStatus::Overdue,
        ];

        for _ in 0..60 {
            let existing = store.transactions().unwrap();
            let op = if existing.is_empty() { 0 } else { rng.gen_range(0..3) };

            match op {
                0 => {
                    let mut amount = f64::from(rng.gen_range(-500i32..5_000));
                    if amount == 0.0 {
                        amount = 1.0;
                    }
                    let status = statuses[rng.gen_range(0..3)];
                    reconciler
                        .create(
                            TransactionRequest::new(&project.id, amount, "Random")
                                .with_status(status),
                        )
                        .unwrap();
                }
                1 => {
                    let target = &existing[rng.gen_range(0..existing.len())];
                    let patch = TransactionPatch {
                        status: rng.gen_bool(0.7).then(|| statuses[rng.gen_range(0..3)]),
                        amount: rng
                            .gen_bool(0.5)
                            .then(|| f64::from(rng.gen_range(1i32..3_000))),
                        ..Default::default()
                    };
                    reconciler.update(&target.id, &patch).unwrap();
                }
                _ => {
                    let target = &existing[rng.gen_range(0..existing.len())];
                    reconciler.delete(&target.id).unwrap();
                }
            }

            assert_ledger_matches(&store, &project.id);
        }
    }
}

#[test]
fn test_concurrent_transitions_do_not_lose_updates() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Busy", 0.0);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let reconciler = TransactionReconciler::new(&store);
                for _ in 0..25 {
                    reconciler.create(received(&project, 10.0)).unwrap();
                }
            });
        }
    });

    assert_eq!(revenue_of(&store, &project.id), 2_000.0);
    assert_ledger_matches(&store, &project.id);
}

#[test]
fn test_concurrent_receipts_of_one_transaction_count_once() {
    for _ in 0..20 {
        let store = MemoryStore::new();
        let project = project_with_budget(&store, "Contended", 0.0);
        let tx = TransactionReconciler::new(&store)
            .create(TransactionRequest::new(&project.id, 1_000.0, "Invoice"))
            .unwrap();
        let gate = std::sync::Barrier::new(8);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let reconciler = TransactionReconciler::new(&store);
                    gate.wait();
                    reconciler
                        .update(&tx.id, &TransactionPatch::status(TransactionStatus::Received))
                        .unwrap();
                });
            }
        });

        assert_eq!(revenue_of(&store, &project.id), 1_000.0);
        assert_ledger_matches(&store, &project.id);
    }
}

#[test]
fn test_rebuild_revenue_matches_ledger() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Rebuilt", 0.0);
    let reconciler = TransactionReconciler::new(&store);
    reconciler.create(received(&project, 400.0)).unwrap();
    reconciler.create(received(&project, 600.0)).unwrap();

    let err = reconciler
        .rebuild_revenue(&RecordId::from("ghost"))
        .unwrap_err();
    assert!(matches!(err, StudioError::NotFound { .. }));

    assert_eq!(reconciler.rebuild_revenue(&project.id).unwrap(), 1_000.0);
    assert_eq!(revenue_of(&store, &project.id), 1_000.0);
}

#[test]
fn test_list_is_newest_first_and_survives_project_delete() {
    let store = MemoryStore::new();
    let project = project_with_budget(&store, "Archive", 0.0);
    let reconciler = TransactionReconciler::new(&store);

    let now = chrono::Utc::now();
    for (days_ago, label) in [(10, "old"), (1, "new"), (5, "mid")] {
        let mut request = TransactionRequest::new(&project.id, 100.0, label);
        request.date = Some(now - chrono::Duration::days(days_ago));
        reconciler.create(request).unwrap();
    }

    let listed = reconciler.list().unwrap();
    let labels: Vec<&str> = listed.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(labels, vec!["new", "mid", "old"]);

    store.delete_project(&project.id).unwrap();
    let listed = reconciler.list().unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|t| t.project.is_none()));
}

#[test]
fn test_profit_reference_scenarios() {
    let store = MemoryStore::new();
    let reconciler = TransactionReconciler::new(&store);

    let busy = project_with_budget(&store, "With tasks", 10_000.0);
    reconciler.create(received(&busy, 6_000.0)).unwrap();
    store
        .insert_task(NewTask::for_project(&busy.id, "Drawings", 3_000.0))
        .unwrap();
    store
        .insert_task(NewTask::for_project(&busy.id, "Site visits", 1_000.0))
        .unwrap();

    let idle = project_with_budget(&store, "No tasks", 10_000.0);
    reconciler.create(received(&idle, 3_000.0)).unwrap();

    let report = analyze_profit(&store.projects().unwrap(), &store.tasks().unwrap());

    let row = &report.projects[0];
    assert_eq!(row.budget_spent, 4_000.0);
    assert_eq!(row.budget_remaining, 6_000.0);
    assert_eq!(row.profit, 2_000.0);
    assert_eq!(row.margin, 50.0);

    let row = &report.projects[1];
    assert_eq!(row.budget_spent, 0.0);
    assert_eq!(row.profit, 3_000.0);
    assert_eq!(row.margin, 30.0);

    assert_eq!(report.overall.total_budget, 16_000.0);
    assert_eq!(report.overall.total_budget_total, 20_000.0);
    assert_eq!(report.overall.total_profit, 5_000.0);
    assert_eq!(report.overall.margin, 125.0);
}

#[test]
fn test_snapshot_excludes_zero_revenue_projects() {
    let store = MemoryStore::new();
    let reconciler = TransactionReconciler::new(&store);
    let earning = project_with_budget(&store, "Earning", 0.0);
    project_with_budget(&store, "Quiet", 0.0);
    reconciler.create(received(&earning, 1_500.0)).unwrap();

    let recorder = SnapshotRecorder::new(&store);
    let first = recorder.record().unwrap();
    let second = recorder.record().unwrap();

    assert_eq!(first.total_revenue, 1_500.0);
    assert_eq!(first.project_revenues.len(), 1);
    assert_eq!(
        first.project_revenues[0].project.as_ref().unwrap().name,
        "Earning"
    );

    assert_ne!(first.id, second.id);
    assert_eq!(first.total_revenue, second.total_revenue);
    assert_eq!(first.project_revenues, second.project_revenues);
    assert_eq!(store.snapshots().unwrap().len(), 2);
}

#[test]
fn test_history_returns_newest_oldest_first() {
    let store = MemoryStore::new();
    let reconciler = TransactionReconciler::new(&store);
    let project = project_with_budget(&store, "History", 0.0);
    let recorder = SnapshotRecorder::new(&store);

    for amount in [100.0, 200.0, 300.0, 400.0] {
        reconciler.create(received(&project, amount)).unwrap();
        recorder.record().unwrap();
    }

    let history = recorder.history(2).unwrap();
    let totals: Vec<f64> = history.iter().map(|s| s.total_revenue).collect();
    assert_eq!(totals, vec![600.0, 1_000.0]);
}

#[test]
fn test_trends_include_fresh_snapshots() {
    let store = MemoryStore::new();
    let recorder = SnapshotRecorder::new(&store);
    recorder.record().unwrap();
    recorder.record().unwrap();

    let points = recorder.trends(30, chrono::Utc::now()).unwrap();
    assert_eq!(points.len(), 2);
    assert!(points[0].timestamp <= points[1].timestamp);

    let future = chrono::Utc::now() + chrono::Duration::days(60);
    assert!(recorder.trends(30, future).unwrap().is_empty());
}

struct ScriptedSuggester {
    budget: Option<BudgetProposal>,
    assignee: Option<String>,
}

impl Suggester for ScriptedSuggester {
    fn name(&self) -> &str {
        "scripted"
    }

    fn suggest_budget<'a>(
        &'a self,
        _project: &'a ProjectAttributes,
    ) -> BoxFuture<'a, Result<BudgetProposal>> {
        let reply = self
            .budget
            .clone()
            .ok_or_else(|| StudioError::Upstream("timeout".into()));
        Box::pin(future::ready(reply))
    }

    fn choose_assignee<'a>(&'a self, _candidates: &'a [Candidate]) -> BoxFuture<'a, Result<String>> {
        let reply = self
            .assignee
            .clone()
            .ok_or_else(|| StudioError::Upstream("unauthorized".into()));
        Box::pin(future::ready(reply))
    }
}

fn scripted(budget: Option<BudgetProposal>, assignee: Option<&str>) -> Arc<dyn Suggester> {
    Arc::new(ScriptedSuggester {
        budget,
        assignee: assignee.map(str::to_string),
    })
}

#[tokio::test]
async fn test_estimator_uses_primary_when_valid() {
    let proposal = BudgetProposal {
        total_budget: 250_000.0,
        breakdown: BudgetBreakdown {
            labor: 165_000.0,
            materials: 60_000.0,
            overhead: 25_000.0,
        },
        justification: "Mid-rise residential scope".into(),
    };
    let estimator = BudgetEstimator::with_suggester(scripted(Some(proposal), None));

    let suggestion = estimator
        .suggest(&ProjectAttributes::named("Riverside"))
        .await;
    assert!(suggestion.success);
    assert_eq!(suggestion.total_budget, 250_000.0);
    assert_eq!(suggestion.justification, "Mid-rise residential scope");
}

#[tokio::test]
async fn test_estimator_falls_back_on_failure_and_bad_output() {
    let failing = BudgetEstimator::with_suggester(scripted(None, None));
    let attrs = ProjectAttributes::named("Riverside").with_team_size(3);
    let suggestion = failing.suggest(&attrs).await;
    assert!(!suggestion.success);
    assert_eq!(suggestion.justification, FALLBACK_JUSTIFICATION);
    assert_eq!(suggestion.total_budget, fallback_budget(3).total_budget);

    let negative = BudgetProposal {
        total_budget: 1_000.0,
        breakdown: BudgetBreakdown {
            labor: 2_000.0,
            materials: -1_000.0,
            overhead: 0.0,
        },
        justification: "should be discarded".into(),
    };
    let suggestion = BudgetEstimator::with_suggester(scripted(Some(negative), None))
        .suggest(&attrs)
        .await;
    assert!(!suggestion.success);
    assert_eq!(suggestion.justification, FALLBACK_JUSTIFICATION);
    let b = suggestion.breakdown;
    assert_eq!(b.labor + b.materials + b.overhead, suggestion.total_budget);
}

fn staff_member(store: &MemoryStore, name: &str, role: &str, open: usize, done: usize) -> RecordId {
    let member = store
        .insert_member(NewTeamMember::new(name, role))
        .unwrap();
    for i in 0..(open + done) {
        let status = if i < open {
            TaskStatus::InProgress
        } else {
            TaskStatus::Complete
        };
        store
            .insert_task(NewTask {
                title: format!("{} task {}", name, i),
                status: Some(status),
                assignee: Some(member.id.clone()),
                ..Default::default()
            })
            .unwrap();
    }
    member.id
}

#[tokio::test]
async fn test_assignment_returns_none_when_everyone_is_full() {
    let store = MemoryStore::new();
    staff_member(&store, "Ana", "Architect", 5, 0);
    staff_member(&store, "Ben", "Architect", 2, 3);

    let selector = AssignmentSelector::new(&store, 5);
    assert_eq!(selector.assign(Some("Architect")).await.unwrap(), None);
    assert_eq!(selector.assign(Some("Engineer")).await.unwrap(), None);
    assert_eq!(selector.assign(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_assignment_prefers_moderate_load_fallback() {
    let store = MemoryStore::new();
    staff_member(&store, "Idle", "Designer", 0, 0);
    let moderate = staff_member(&store, "Moderate", "Designer", 2, 1);
    staff_member(&store, "Heavier", "Designer", 3, 0);

    let selector = AssignmentSelector::new(&store, 5);
    assert_eq!(
        selector.assign(Some("Designer")).await.unwrap(),
        Some(moderate)
    );
}

#[tokio::test]
async fn test_assignment_validates_suggester_choice() {
    let store = MemoryStore::new();
    let low = staff_member(&store, "Low", "Drafter", 2, 0);
    let high = staff_member(&store, "High", "Drafter", 3, 0);

    let padded = format!(" {}\n", high);
    let trusted = AssignmentSelector::new(&store, 5)
        .with_suggester(Some(scripted(None, Some(padded.as_str()))));
    assert_eq!(trusted.assign(Some("Drafter")).await.unwrap(), Some(high));

    let hallucinated = AssignmentSelector::new(&store, 5)
        .with_suggester(Some(scripted(None, Some("not-a-member"))));
    assert_eq!(
        hallucinated.assign(Some("Drafter")).await.unwrap(),
        Some(low.clone())
    );

    let unavailable =
        AssignmentSelector::new(&store, 5).with_suggester(Some(scripted(None, None)));
    assert_eq!(unavailable.assign(Some("Drafter")).await.unwrap(), Some(low));
}

#[tokio::test]
async fn test_api_transaction_lifecycle() {
    let studio = Studio::new(MemoryStore::new(), StudioConfig::default());
    let project = project_with_budget(studio.store(), "Api", 5_000.0);
    let api = studio.api();

    let created = api
        .handle(
            Method::Post,
            "/api/revenue-transactions",
            None,
            Some(&json!({
                "project": project.id,
                "amount": 1200,
                "description": "Deposit",
                "category": "Milestone",
                "status": "Received",
                "invoiceId": "INV-001"
            })),
        )
        .await;
    assert_eq!(created.status, 201);
    assert_eq!(created.body["project"]["name"], "Api");
    assert_eq!(created.body["invoiceId"], "INV-001");
    let id = created.body["id"].as_str().unwrap().to_string();

    let stats = api.handle(Method::Get, "revenue/stats", None, None).await;
    assert_eq!(stats.status, 200);
    assert_eq!(stats.body["totalRevenue"], 1200.0);
    assert_eq!(stats.body["projectRevenues"][0]["projectName"], "Api");

    let updated = api
        .handle(
            Method::Put,
            &format!("revenue-transactions/{}", id),
            None,
            Some(&json!({ "status": "Overdue" })),
        )
        .await;
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["status"], "Overdue");
    assert_eq!(revenue_of(studio.store(), &project.id), 0.0);

    let deleted = api
        .handle(Method::Delete, &format!("revenue-transactions/{}", id), None, None)
        .await;
    assert_eq!(deleted.status, 200);
    assert_eq!(deleted.body["message"], "Transaction deleted");

    let missing = api
        .handle(Method::Delete, &format!("revenue-transactions/{}", id), None, None)
        .await;
    assert_eq!(missing.status, 404);
    assert_eq!(missing.body["message"], "Transaction not found");
}

#[tokio::test]
async fn test_api_rejects_bad_input() {
    let studio = Studio::new(MemoryStore::new(), StudioConfig::default());
    let api = studio.api();

    let missing = api
        .handle(
            Method::Post,
            "revenue-transactions",
            None,
            Some(&json!({ "amount": 10 })),
        )
        .await;
    assert_eq!(missing.status, 400);
    assert_eq!(missing.body["message"], "Failed to create revenue transaction");

    let bad_enum = api
        .handle(
            Method::Post,
            "revenue-transactions",
            None,
            Some(&json!({ "project": "p", "amount": 10, "description": "x", "status": "Paid" })),
        )
        .await;
    assert_eq!(bad_enum.status, 400);

    let unknown = api.handle(Method::Get, "revenue/everything", None, None).await;
    assert_eq!(unknown.status, 404);
}

#[tokio::test]
async fn test_api_reports_store_outage_as_500() {
    let studio = Studio::new(MemoryStore::new(), StudioConfig::default());
    studio.store().set_offline(true);

    let response = studio
        .api()
        .handle(Method::Get, "revenue/profit", None, None)
        .await;
    assert_eq!(response.status, 500);
    assert_eq!(response.body["message"], "Failed to fetch profit analysis");
}

#[tokio::test]
async fn test_api_snapshots_history_trends_and_budget() {
    let studio = Studio::new(MemoryStore::new(), StudioConfig::default());
    let project = project_with_budget(studio.store(), "Charts", 0.0);
    studio.reconciler().create(received(&project, 750.0)).unwrap();
    let api = studio.api();

    for _ in 0..3 {
        let created = api.handle(Method::Post, "revenue/snapshot", None, None).await;
        assert_eq!(created.status, 201);
        assert_eq!(created.body["projectRevenues"][0]["project"]["name"], "Charts");
    }

    let history = api
        .handle(Method::Get, "revenue/history", Some("limit=2"), None)
        .await;
    assert_eq!(history.body.as_array().unwrap().len(), 2);

    let trends = api
        .handle(Method::Get, "revenue/trends", Some("range=7"), None)
        .await;
    let points = trends.body.as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["revenue"], 750.0);

    let profit = api.handle(Method::Get, "revenue/profit", None, None).await;
    assert_eq!(profit.body["overall"]["totalRevenue"], 750.0);
    assert_eq!(profit.body["projects"][0]["margin"], 0.0);

    let budget = api
        .handle(
            Method::Post,
            "budget/suggest",
            None,
            Some(&json!({ "name": "Charts", "teamSize": 4 })),
        )
        .await;
    assert_eq!(budget.status, 200);
    assert_eq!(budget.body["success"], false);
    assert_eq!(budget.body["justification"], FALLBACK_JUSTIFICATION);
}
