//! Integration tests for transaction-store

use bigdecimal::BigDecimal;
use std::io::Write;
use std::str::FromStr;

use transaction_store::ingest::{self, CsvKind, CsvOptions};
use transaction_store::reconciliation::{self, ReconciliationEngine, ReconciliationRule};
use transaction_store::{
    utils::MemoryStore, Fields, KeyValueStore, PaymentRequestRepository, TransactionRepository,
    TransactionStatus, TRANSACTION_PREFIX,
};

fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[tokio::test]
async fn test_create_uses_supplied_status() {
    let mut transactions = TransactionRepository::new(MemoryStore::new());

    for status in [
        TransactionStatus::Pending,
        TransactionStatus::Completed,
        TransactionStatus::Failed,
        TransactionStatus::Cancelled,
    ] {
        let record = transactions
            .create(BigDecimal::from_str("19.99").unwrap(), "user-1", Some(status))
            .await
            .unwrap();
        assert_eq!(record.field("status"), Some(status.as_str()));

        let stored = transactions.get(&record.key).await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    let record = transactions
        .create(BigDecimal::from(5), "user-2", None)
        .await
        .unwrap();
    assert_eq!(record.field("status"), Some("pending"));
    assert_eq!(transactions.list().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_update_changes_only_status_and_timestamp() {
    let store = MemoryStore::new();
    let mut transactions = TransactionRepository::new(store.clone());

    let created = transactions
        .create(BigDecimal::from(2500), "user-9", None)
        .await
        .unwrap();

    // fields written by other producers must survive an update
    let mut handle = store.clone();
    handle
        .hash_set(&created.key, &fields(&[("channel", "ussd"), ("note", "première")]))
        .await
        .unwrap();
    let before = transactions.get(&created.key).await.unwrap().unwrap();

    let id = created.key.trim_start_matches(TRANSACTION_PREFIX);
    let updated = transactions
        .update(id, TransactionStatus::Completed)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.field("status"), Some("completed"));
    assert!(updated.field("timestamp").is_some());
    for (name, value) in &before.fields {
        if name != "status" && name != "timestamp" {
            assert_eq!(updated.fields.get(name), Some(value), "field {name} changed");
        }
    }
    assert_eq!(updated.fields.len(), before.fields.len());

    let typed = transactions.get_typed(id).await.unwrap().unwrap();
    assert_eq!(typed.status, TransactionStatus::Completed);
    assert_eq!(typed.amount, BigDecimal::from(2500));
}

#[tokio::test]
async fn test_missing_transaction_is_not_an_error() {
    let store = MemoryStore::new();
    let mut transactions = TransactionRepository::new(store.clone());

    assert!(transactions
        .update("does-not-exist", TransactionStatus::Failed)
        .await
        .unwrap()
        .is_none());
    assert!(transactions.get("does-not-exist").await.unwrap().is_none());
    assert!(transactions.get_typed("does-not-exist").await.unwrap().is_none());

    // update must not create the key as a side effect
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_unusual_ids_read_as_missing() {
    let store = MemoryStore::new();
    let mut transactions = TransactionRepository::new(store.clone());

    for id in ["", "a b"] {
        assert!(transactions.get(id).await.unwrap().is_none());
        assert!(transactions
            .update(id, TransactionStatus::Completed)
            .await
            .unwrap()
            .is_none());
    }

    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_list_only_returns_prefixed_keys() {
    let store = MemoryStore::new();
    let mut handle = store.clone();
    let noise = fields(&[("a", "1")]);
    for key in ["request:mvola:1", "session:42", "transactions", "xtransaction:1"] {
        handle.hash_set(key, &noise).await.unwrap();
    }

    let mut transactions = TransactionRepository::new(store);
    assert!(transactions.list().await.unwrap().is_empty());

    let created = transactions
        .create(BigDecimal::from(1), "user-1", None)
        .await
        .unwrap();
    assert_eq!(transactions.list().await.unwrap(), vec![created.key]);
}

#[tokio::test]
async fn test_delete_all() {
    let store = MemoryStore::new();
    let mut transactions = TransactionRepository::new(store.clone());

    assert_eq!(transactions.delete_all().await.unwrap(), 0);
    assert_eq!(store.delete_calls(), 0);

    let mut handle = store.clone();
    handle
        .hash_set("request:mvola:7", &fields(&[("key", "request:mvola:7")]))
        .await
        .unwrap();
    for user in ["a", "b", "c"] {
        transactions
            .create(BigDecimal::from(10), user, None)
            .await
            .unwrap();
    }

    assert_eq!(transactions.delete_all().await.unwrap(), 3);
    assert_eq!(store.delete_calls(), 1);
    assert!(transactions.list().await.unwrap().is_empty());
    assert!(store.exists("request:mvola:7").await.unwrap());
}

#[tokio::test]
async fn test_payment_request_details_and_export() {
    let store = MemoryStore::new();
    let mut requests = PaymentRequestRepository::new(store.clone());
    requests
        .seed(&["1".to_string(), "2".to_string()])
        .await
        .unwrap();

    let mut handle = store.clone();
    handle
        .hash_set("request:mvola:3", &fields(&[("transaction_id", "3")]))
        .await
        .unwrap();

    let mut keys = requests.list().await.unwrap();
    assert_eq!(keys.len(), 3);
    keys.push("request:mvola:404".to_string());

    let records = requests.details(&keys).await.unwrap();
    assert_eq!(records.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("redis_transaction_details.txt");
    let written = requests.export_keys(&records, &out).unwrap();

    assert_eq!(written, 2);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "request:mvola:1\nrequest:mvola:2\n"
    );
}

#[tokio::test]
async fn test_reconciliation_workflow() {
    let store = MemoryStore::new();
    let mut requests = PaymentRequestRepository::new(store.clone());
    requests
        .seed(&["A".to_string(), "B".to_string(), "C".to_string()])
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("transaction_mvola_verif.csv");
    let mut csv_file = std::fs::File::create(&csv_path).unwrap();
    writeln!(csv_file, "transaction_id,obs\nB,OK\nC, OK \nD,OK\nA,ok").unwrap();

    let text_path = dir.path().join("old_transaction.txt");
    std::fs::write(&text_path, "request:mvola:C\n\n  request:mvola:E  \n").unwrap();

    let store_ids = requests.list().await.unwrap();
    let csv_ids = ingest::load_csv_path(&csv_path, CsvKind::TransactionId, &CsvOptions::default())
        .unwrap();
    let text_ids = ingest::load_text_path(&text_path).unwrap();

    let report = ReconciliationEngine::new(store_ids, csv_ids, text_ids)
        .reconcile(ReconciliationRule::StoreAndCsv);
    assert_eq!(
        report.matched_keys(),
        vec!["request:mvola:B".to_string(), "request:mvola:C".to_string()]
    );

    // computing the report alone removes nothing
    assert_eq!(store.len().unwrap(), 3);
    assert_eq!(store.delete_calls(), 0);

    let deletion_log = dir.path().join("deleted_transaction_redis.txt");
    let deleted = reconciliation::apply(&report, &mut requests, Some(&deletion_log))
        .await
        .unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(store.delete_calls(), 1);
    assert_eq!(requests.list().await.unwrap(), vec!["request:mvola:A".to_string()]);
    assert_eq!(
        std::fs::read_to_string(&deletion_log).unwrap(),
        "Deleted transaction: request:mvola:B\nDeleted transaction: request:mvola:C\n"
    );
}

#[tokio::test]
async fn test_unreadable_exports_become_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.csv");
    let malformed = dir.path().join("malformed.csv");
    std::fs::write(&malformed, "key,date\nk1,yesterday\n").unwrap();

    let options = CsvOptions::default();
    assert!(ingest::load_csv_or_empty(&missing, CsvKind::Key, &options).is_empty());
    assert!(ingest::load_csv_or_empty(&malformed, CsvKind::Key, &options).is_empty());
    assert!(ingest::load_csv_path(&malformed, CsvKind::Key, &options).is_err());
    assert!(ingest::load_text_or_empty(&missing).is_empty());

    let report = ReconciliationEngine::new(vec!["request:mvola:1".to_string()], Vec::new(), Vec::new())
        .reconcile(ReconciliationRule::StoreAndCsv);
    let mut requests = PaymentRequestRepository::new(MemoryStore::new());
    assert_eq!(
        reconciliation::apply(&report, &mut requests, None).await.unwrap(),
        0
    );
    assert_eq!(requests.storage().delete_calls(), 0);
}
