//! Transaction types and the fixed category set

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a transaction. The stored amount is always the absolute
/// value; this enum carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnKind {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
}

impl TxnKind {
    pub fn label(&self) -> &'static str {
        match self {
            TxnKind::Income => "income",
            TxnKind::Expense => "expense",
        }
    }
}

/// A single dashboard transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Absolute value; direction lives in `kind`.
    pub amount: f64,
    pub kind: TxnKind,
    pub category: String,
    /// None until the model has looked at this transaction.
    pub anomaly: Option<bool>,
}

impl Transaction {
    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }

    /// Signed amount: expenses negative, income positive.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TxnKind::Income => self.amount,
            TxnKind::Expense => -self.amount,
        }
    }
}

/// One row of a parsed statement, before it is adopted into the store.
/// `amount` is still signed here; the store converts sign to `TxnKind`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

/// The fixed category set, shared between the manual-edit UI and the
/// categorize prompt.
pub const CATEGORIES: [&str; 9] = [
    "Food & Dining",
    "Shopping",
    "Transportation",
    "Entertainment",
    "Utilities",
    "Housing",
    "Health & Fitness",
    "Travel",
    "Income",
];

/// Fallback for transactions no one has categorized yet.
pub const UNCATEGORIZED: &str = "Uncategorized";

pub fn is_known_category(category: &str) -> bool {
    category == UNCATEGORIZED || CATEGORIES.contains(&category)
}

/// What to do when the model returns a category outside the fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategoryPolicy {
    /// Keep whatever string came back.
    Accept,
    /// Drop the assignment, leaving the transaction unchanged.
    Reject,
    /// Replace the unknown category with `Uncategorized` (keeps the anomaly flag).
    #[default]
    Coerce,
}

/// One element of a categorize response, matched back to a transaction by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryAssignment {
    pub id: String,
    pub category: String,
    #[serde(rename = "isAnomaly")]
    pub is_anomaly: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_amount() {
        let mut t = Transaction {
            id: "txn-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            description: "Coffee Shop".to_string(),
            amount: 6.50,
            kind: TxnKind::Expense,
            category: UNCATEGORIZED.to_string(),
            anomaly: None,
        };
        assert_eq!(t.signed_amount(), -6.50);
        t.kind = TxnKind::Income;
        assert_eq!(t.signed_amount(), 6.50);
    }

    #[test]
    fn test_known_categories() {
        assert!(is_known_category("Food & Dining"));
        assert!(is_known_category(UNCATEGORIZED));
        assert!(!is_known_category("Crypto Winnings"));
        assert!(!is_known_category("food & dining"));
    }

    #[test]
    fn test_assignment_wire_field_name() {
        let a: CategoryAssignment =
            serde_json::from_str(r#"{"id":"txn-1","category":"Travel","isAnomaly":true}"#).unwrap();
        assert_eq!(a.id, "txn-1");
        assert!(a.is_anomaly);
    }
}
