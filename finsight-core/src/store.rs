//! The in-memory transaction store and its JSON persistence.
//!
//! All mutation is whole-list replacement: read the current list, produce a
//! new one, install it. There is exactly one writer timeline (the UI event
//! loop), so no locking is needed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::seed;
use crate::transaction::{
    is_known_category, CategoryAssignment, StatementRow, Transaction, TxnKind,
    UnknownCategoryPolicy, UNCATEGORIZED,
};

#[derive(Debug, Clone)]
pub struct TransactionStore {
    txns: Vec<Transaction>,
    next_id: u64,
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self { txns: Vec::new(), next_id: 1 }
    }
}

/// Aggregate view rendered by the overview tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    /// Expense totals per category, largest first.
    pub by_category: Vec<(String, f64)>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(txns: Vec<Transaction>) -> Self {
        let next_id = txns.iter().filter_map(|t| parse_id_seq(&t.id)).max().map_or(1, |n| n + 1);
        Self { txns, next_id }
    }

    /// Fresh store pre-populated with the demo seed transactions.
    pub fn seeded() -> Self {
        Self::from_transactions(seed::seed_transactions())
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.txns
    }

    pub fn len(&self) -> usize {
        self.txns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    pub fn uncategorized(&self) -> Vec<Transaction> {
        self.txns.iter().filter(|t| t.is_uncategorized()).cloned().collect()
    }

    /// Adopt parsed statement rows: assign fresh ids, split the signed
    /// amount into `(kind, abs)`, and append. Duplicate detection is
    /// deliberately absent.
    pub fn append_rows(&mut self, rows: Vec<StatementRow>) -> usize {
        let mut next = self.txns.clone();
        let count = rows.len();
        for row in rows {
            let kind = if row.amount < 0.0 { TxnKind::Expense } else { TxnKind::Income };
            next.push(Transaction {
                id: format!("txn-{}", self.next_id),
                date: row.date,
                description: row.description,
                amount: row.amount.abs(),
                kind,
                category: UNCATEGORIZED.to_string(),
                anomaly: None,
            });
            self.next_id += 1;
        }
        self.txns = next;
        count
    }

    /// Merge categorize responses by id. Transactions whose id is absent
    /// from the response are untouched; everything except category and the
    /// anomaly flag stays as it was. Returns the number of updated rows.
    pub fn apply_assignments(
        &mut self,
        assignments: &[CategoryAssignment],
        policy: UnknownCategoryPolicy,
    ) -> usize {
        let by_id: HashMap<&str, &CategoryAssignment> =
            assignments.iter().map(|a| (a.id.as_str(), a)).collect();

        let mut updated = 0;
        let next = self
            .txns
            .iter()
            .map(|t| {
                let Some(a) = by_id.get(t.id.as_str()) else {
                    return t.clone();
                };
                let category = if is_known_category(&a.category) {
                    a.category.clone()
                } else {
                    match policy {
                        UnknownCategoryPolicy::Accept => a.category.clone(),
                        UnknownCategoryPolicy::Reject => return t.clone(),
                        UnknownCategoryPolicy::Coerce => {
                            log::warn!("unknown category {:?} for {}; coercing", a.category, t.id);
                            UNCATEGORIZED.to_string()
                        }
                    }
                };
                updated += 1;
                Transaction {
                    category,
                    anomaly: Some(a.is_anomaly),
                    ..t.clone()
                }
            })
            .collect();
        self.txns = next;
        updated
    }

    /// Manual category edit from the transactions view. The UI constrains
    /// the value to the fixed set; the store just assigns it.
    pub fn set_category(&mut self, id: &str, category: &str) -> bool {
        let mut found = false;
        let next = self
            .txns
            .iter()
            .map(|t| {
                if t.id == id {
                    found = true;
                    Transaction { category: category.to_string(), ..t.clone() }
                } else {
                    t.clone()
                }
            })
            .collect();
        self.txns = next;
        found
    }

    pub fn summary(&self) -> Summary {
        let mut income = 0.0;
        let mut expenses = 0.0;
        let mut per_cat: HashMap<String, f64> = HashMap::new();
        for t in &self.txns {
            match t.kind {
                TxnKind::Income => income += t.amount,
                TxnKind::Expense => {
                    expenses += t.amount;
                    *per_cat.entry(t.category.clone()).or_insert(0.0) += t.amount;
                }
            }
        }
        let mut by_category: Vec<(String, f64)> = per_cat.into_iter().collect();
        by_category.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Summary { income, expenses, balance: income - expenses, by_category }
    }

    /// Read the persisted blob, or fall back to seed data when it does not
    /// exist yet. The blob is read once at startup.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::seeded());
        }
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let txns: Vec<Transaction> =
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(Self::from_transactions(txns))
    }

    /// Write the whole list. Called after every mutation.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.txns)?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

fn parse_id_seq(id: &str) -> Option<u64> {
    id.strip_prefix("txn-")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn uncategorized(id: &str, desc: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: day(1),
            description: desc.to_string(),
            amount,
            kind: TxnKind::Expense,
            category: UNCATEGORIZED.to_string(),
            anomaly: None,
        }
    }

    #[test]
    fn test_append_rows_splits_sign() {
        let mut store = TransactionStore::new();
        store.append_rows(vec![
            StatementRow { date: day(2), description: "Paycheck".into(), amount: 50.0 },
            StatementRow { date: day(3), description: "Groceries".into(), amount: -50.0 },
        ]);
        let txns = store.transactions();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].kind, TxnKind::Income);
        assert_eq!(txns[0].amount, 50.0);
        assert_eq!(txns[1].kind, TxnKind::Expense);
        assert_eq!(txns[1].amount, 50.0);
        assert!(txns[1].is_uncategorized());
    }

    #[test]
    fn test_ids_keep_counting_after_reload() {
        let mut store = TransactionStore::new();
        store.append_rows(vec![StatementRow {
            date: day(2),
            description: "A".into(),
            amount: -1.0,
        }]);
        let reloaded = TransactionStore::from_transactions(store.transactions().to_vec());
        let mut reloaded = reloaded;
        reloaded.append_rows(vec![StatementRow {
            date: day(3),
            description: "B".into(),
            amount: -1.0,
        }]);
        let ids: Vec<_> = reloaded.transactions().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["txn-1", "txn-2"]);
    }

    #[test]
    fn test_apply_assignments_merges_by_id() {
        let mut store =
            TransactionStore::from_transactions(vec![uncategorized("txn-1", "Coffee Shop", 6.50)]);
        let n = store.apply_assignments(
            &[CategoryAssignment {
                id: "txn-1".to_string(),
                category: "Food & Dining".to_string(),
                is_anomaly: false,
            }],
            UnknownCategoryPolicy::Coerce,
        );
        assert_eq!(n, 1);
        let t = &store.transactions()[0];
        assert_eq!(t.category, "Food & Dining");
        assert_eq!(t.anomaly, Some(false));
        assert_eq!(t.amount, 6.50);
        assert_eq!(t.description, "Coffee Shop");
        assert_eq!(t.date, day(1));
    }

    #[test]
    fn test_apply_assignments_ignores_unmatched_ids() {
        let before = vec![uncategorized("txn-1", "Coffee Shop", 6.50)];
        let mut store = TransactionStore::from_transactions(before.clone());
        let n = store.apply_assignments(
            &[CategoryAssignment {
                id: "txn-999".to_string(),
                category: "Travel".to_string(),
                is_anomaly: true,
            }],
            UnknownCategoryPolicy::Coerce,
        );
        assert_eq!(n, 0);
        assert_eq!(store.transactions(), before.as_slice());
    }

    #[test]
    fn test_unknown_category_policies() {
        let assignment = CategoryAssignment {
            id: "txn-1".to_string(),
            category: "Crypto Winnings".to_string(),
            is_anomaly: true,
        };

        let mut store = TransactionStore::from_transactions(vec![uncategorized("txn-1", "X", 1.0)]);
        store.apply_assignments(std::slice::from_ref(&assignment), UnknownCategoryPolicy::Accept);
        assert_eq!(store.transactions()[0].category, "Crypto Winnings");

        let mut store = TransactionStore::from_transactions(vec![uncategorized("txn-1", "X", 1.0)]);
        store.apply_assignments(std::slice::from_ref(&assignment), UnknownCategoryPolicy::Reject);
        assert_eq!(store.transactions()[0].category, UNCATEGORIZED);
        assert_eq!(store.transactions()[0].anomaly, None);

        let mut store = TransactionStore::from_transactions(vec![uncategorized("txn-1", "X", 1.0)]);
        store.apply_assignments(std::slice::from_ref(&assignment), UnknownCategoryPolicy::Coerce);
        assert_eq!(store.transactions()[0].category, UNCATEGORIZED);
        assert_eq!(store.transactions()[0].anomaly, Some(true));
    }

    #[test]
    fn test_set_category() {
        let mut store = TransactionStore::from_transactions(vec![uncategorized("txn-1", "X", 1.0)]);
        assert!(store.set_category("txn-1", "Shopping"));
        assert_eq!(store.transactions()[0].category, "Shopping");
        assert!(!store.set_category("txn-2", "Shopping"));
    }

    #[test]
    fn test_summary_totals() {
        let mut txns = vec![uncategorized("txn-1", "Rent", 1200.0)];
        txns[0].category = "Housing".to_string();
        txns.push(Transaction {
            id: "txn-2".to_string(),
            date: day(2),
            description: "Paycheck".to_string(),
            amount: 3000.0,
            kind: TxnKind::Income,
            category: "Income".to_string(),
            anomaly: None,
        });
        txns.push(Transaction {
            category: "Food & Dining".to_string(),
            ..uncategorized("txn-3", "Groceries", 80.0)
        });
        let summary = TransactionStore::from_transactions(txns).summary();
        assert_eq!(summary.income, 3000.0);
        assert_eq!(summary.expenses, 1280.0);
        assert_eq!(summary.balance, 1720.0);
        assert_eq!(summary.by_category[0], ("Housing".to_string(), 1200.0));
    }
}
