//! Reconciliation dry run against the in-memory store

use bigdecimal::BigDecimal;
use transaction_store::ingest::{load_csv, load_text, CsvKind, CsvOptions};
use transaction_store::reconciliation::{apply, ReconciliationEngine, ReconciliationRule};
use transaction_store::utils::MemoryStore;
use transaction_store::{PaymentRequestRepository, TransactionRepository, TransactionStatus};

const VERIFICATION_CSV: &str = "transaction_id,obs
2307191028187690012,OK
2307191028187690013, OK
2307191028187690014,KO
2307191028187690099,OK
";

const OLD_TRANSACTIONS: &str = "request:mvola:2307191028187690013

request:mvola:2307191028187690077
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Transaction Store - In-memory Reconciliation Example\n");

    let store = MemoryStore::new();

    // 1. Generic transactions
    println!("Creating transactions...");
    let mut transactions = TransactionRepository::new(store.clone());
    let record = transactions
        .create(BigDecimal::from(20000), "user-101", None)
        .await?;
    println!("  Created {} ({:?})", record.key, record.field("status"));

    let id = record.key.trim_start_matches("transaction:");
    if let Some(updated) = transactions.update(id, TransactionStatus::Completed).await? {
        println!("  Updated {} ({:?})", updated.key, updated.field("status"));
    }
    println!();

    // 2. Payment requests as the provider integration would have left them
    println!("Seeding payment requests...");
    let mut requests = PaymentRequestRepository::new(store.clone());
    let seeded = requests
        .seed(&[
            "2307191028187690012".to_string(),
            "2307191028187690013".to_string(),
            "2307191028187690014".to_string(),
        ])
        .await?;
    println!("  Seeded {seeded} requests\n");

    // 3. Compare against the exports
    let store_ids = requests.list().await?;
    let csv_ids = load_csv(
        VERIFICATION_CSV.as_bytes(),
        CsvKind::TransactionId,
        &CsvOptions::default(),
    )?;
    let text_ids = load_text(OLD_TRANSACTIONS.as_bytes())?;

    let engine = ReconciliationEngine::new(store_ids, csv_ids, text_ids);
    for rule in [ReconciliationRule::StoreAndCsv, ReconciliationRule::StoreAndText] {
        let report = engine.reconcile(rule);
        println!("{rule:?}: {} matched", report.matched.len());
        for key in &report.matched {
            println!("  {key}");
        }
    }
    println!();

    // 4. Delete what the CSV confirms
    let report = engine.reconcile(ReconciliationRule::default());
    let deleted = apply(&report, &mut requests, None).await?;
    println!("Deleted {deleted} requests, {} keys left in the store", store.len()?);

    Ok(())
}
