//! Reconciliation of store keys against exported transaction lists
//!
//! Identifiers are collected from three sources (the store, a CSV export and
//! a plain-text list) and intersected according to a [`ReconciliationRule`].
//! Computing a report never touches the store; removing the matched keys is
//! a separate, explicit [`apply`] step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::repository::PaymentRequestRepository;
use crate::traits::*;
use crate::types::*;

/// Which pair of sources decides what is stale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconciliationRule {
    /// Keys present both in the store and in the CSV export
    #[default]
    StoreAndCsv,
    /// Keys present both in the store and in the text list
    StoreAndText,
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub rule: ReconciliationRule,
    /// Distinct identifiers per source
    pub store_count: usize,
    pub csv_count: usize,
    pub text_count: usize,
    /// Keys selected by the rule, candidates for deletion
    pub matched: BTreeSet<String>,
}

impl ReconciliationReport {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Matched keys in a form suitable for a bulk delete
    pub fn matched_keys(&self) -> Vec<String> {
        self.matched.iter().cloned().collect()
    }
}

/// Identifier sets from the three sources
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    store: BTreeSet<String>,
    csv: BTreeSet<String>,
    text: BTreeSet<String>,
}

impl ReconciliationEngine {
    pub fn new<A, B, C>(store: A, csv: B, text: C) -> Self
    where
        A: IntoIterator<Item = String>,
        B: IntoIterator<Item = String>,
        C: IntoIterator<Item = String>,
    {
        Self {
            store: store.into_iter().collect(),
            csv: csv.into_iter().collect(),
            text: text.into_iter().collect(),
        }
    }

    pub fn store(&self) -> &BTreeSet<String> {
        &self.store
    }

    pub fn csv(&self) -> &BTreeSet<String> {
        &self.csv
    }

    pub fn text(&self) -> &BTreeSet<String> {
        &self.text
    }

    /// Intersect the sources selected by `rule`
    pub fn reconcile(&self, rule: ReconciliationRule) -> ReconciliationReport {
        let other = match rule {
            ReconciliationRule::StoreAndCsv => &self.csv,
            ReconciliationRule::StoreAndText => &self.text,
        };
        let matched: BTreeSet<String> = self.store.intersection(other).cloned().collect();

        if matched.is_empty() {
            log::info!("No matching transactions found for deletion");
        } else {
            log::info!("{} transactions to delete after intersection", matched.len());
        }

        ReconciliationReport {
            rule,
            store_count: self.store.len(),
            csv_count: self.csv.len(),
            text_count: self.text.len(),
            matched,
        }
    }
}

/// Delete the keys matched in `report`
///
/// Every key is recorded in `deletion_log` when one is given. Returns the
/// number of keys the store reports as removed.
pub async fn apply<S: KeyValueStore>(
    report: &ReconciliationReport,
    repository: &mut PaymentRequestRepository<S>,
    deletion_log: Option<&Path>,
) -> StoreResult<usize> {
    if report.is_empty() {
        return Ok(0);
    }
    repository.delete(&report.matched_keys(), deletion_log).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn engine() -> ReconciliationEngine {
        ReconciliationEngine::new(
            ids(&["A", "B", "C"]),
            ids(&["B", "C", "D"]),
            ids(&["C", "E"]),
        )
    }

    #[test]
    fn test_store_and_csv_ignores_text() {
        let report = engine().reconcile(ReconciliationRule::default());

        assert_eq!(report.matched, BTreeSet::from(["B".to_string(), "C".to_string()]));
        assert_eq!((report.store_count, report.csv_count, report.text_count), (3, 3, 2));
        assert!(!report.matched.contains("D"));
        assert!(!report.matched.contains("E"));
    }

    #[test]
    fn test_store_and_text() {
        let report = engine().reconcile(ReconciliationRule::StoreAndText);
        assert_eq!(report.matched_keys(), vec!["C".to_string()]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let engine = ReconciliationEngine::new(ids(&["A", "A"]), ids(&["A"]), Vec::new());
        let report = engine.reconcile(ReconciliationRule::StoreAndCsv);

        assert_eq!(report.store_count, 1);
        assert_eq!(report.matched_keys(), vec!["A".to_string()]);
    }

    #[test]
    fn test_empty_sources() {
        let report = ReconciliationEngine::default().reconcile(ReconciliationRule::StoreAndCsv);
        assert!(report.is_empty());
    }
}
