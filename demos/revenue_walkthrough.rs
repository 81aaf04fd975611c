use dotenv::dotenv;
use serde_json::json;
use studio_ledger::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = StudioConfig::from_env()?;
    println!(
        "⚙️  AI collaborator: {}",
        if config.has_ai_credential() { "configured" } else { "local rules only" }
    );

    let studio = Studio::new(MemoryStore::new(), config);
    let store = studio.store();

    let pavilion = store.insert_project(NewProject::named("Harbor Pavilion").with_budget(120_000.0))?;
    let library = store.insert_project(NewProject::named("Hillside Library").with_budget(80_000.0))?;

    store.insert_task(NewTask::for_project(&pavilion.id, "Schematic design", 30_000.0))?;
    store.insert_task(NewTask::for_project(&pavilion.id, "Structural review", 12_000.0))?;
    for (name, role) in [("Maya", "Architect"), ("Jon", "Architect"), ("Lee", "Engineer")] {
        store.insert_member(NewTeamMember::new(name, role))?;
    }

    println!("\n💵 Recording transactions...");
    let reconciler = studio.reconciler();
    let deposit = reconciler.create(
        TransactionRequest::new(&pavilion.id, 45_000.0, "Design deposit")
            .with_category(TransactionCategory::Milestone)
            .with_status(TransactionStatus::Received),
    )?;
    let retainer = reconciler.create(
        TransactionRequest::new(&library.id, 20_000.0, "Monthly retainer")
            .with_category(TransactionCategory::Retainer),
    )?;
    reconciler.update(&retainer.id, &TransactionPatch::status(TransactionStatus::Received))?;
    reconciler.update(&deposit.id, &TransactionPatch::amount(50_000.0))?;

    for tx in reconciler.list()? {
        println!(
            "  {:<18} {:>10.2}  {:?}",
            tx.project.map(|p| p.name).unwrap_or_default(),
            tx.amount,
            tx.status
        );
    }

    println!("\n📸 Taking a snapshot...");
    let snapshot = studio.snapshots().record()?;
    println!("  Total revenue: {:.2}", snapshot.total_revenue);

    println!("\n📊 Profit analysis");
    let report = analyze_profit(&store.projects()?, &store.tasks()?);
    for row in &report.projects {
        println!(
            "  {:<18} revenue {:>10.2}  spent {:>10.2}  profit {:>10.2}  margin {:>6.2}%",
            row.project_name, row.revenue, row.budget_spent, row.profit, row.margin
        );
    }
    println!(
        "  Overall margin: {:.2}% on {:.2} profit",
        report.overall.margin, report.overall.total_profit
    );

    println!("\n🧮 Budget suggestion");
    let suggestion = studio
        .estimator()
        .suggest(&ProjectAttributes::named("Riverside Clinic").with_team_size(4))
        .await;
    println!(
        "  {:.2} (labor {:.2}, materials {:.2}, overhead {:.2}) - {}",
        suggestion.total_budget,
        suggestion.breakdown.labor,
        suggestion.breakdown.materials,
        suggestion.breakdown.overhead,
        suggestion.justification
    );

    println!("\n👥 Assignment");
    match studio.assignments().assign(Some("Architect")).await? {
        Some(id) => println!("  Next Architect task goes to member {}", id),
        None => println!("  Every Architect is at the task limit"),
    }

    println!("\n🌐 GET /api/revenue/trends?range=7");
    let response = studio
        .api()
        .handle(Method::Get, "/api/revenue/trends", Some("range=7"), None)
        .await;
    println!("  {} {}", response.status, serde_json::to_string_pretty(&response.body)?);

    let response = studio
        .api()
        .handle(
            Method::Post,
            "/api/revenue-transactions",
            None,
            Some(&json!({ "amount": 100 })),
        )
        .await;
    println!("  POST without a project -> {} {}", response.status, response.body);

    Ok(())
}
