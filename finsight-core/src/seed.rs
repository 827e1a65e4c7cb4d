//! Demo transactions used when no persisted store exists yet.

use chrono::NaiveDate;

use crate::transaction::{Transaction, TxnKind, UNCATEGORIZED};

fn txn(
    seq: u64,
    date: (i32, u32, u32),
    description: &str,
    amount: f64,
    kind: TxnKind,
    category: &str,
) -> Transaction {
    Transaction {
        id: format!("txn-{seq}"),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid seed date"),
        description: description.to_string(),
        amount,
        kind,
        category: category.to_string(),
        anomaly: None,
    }
}

pub fn seed_transactions() -> Vec<Transaction> {
    vec![
        txn(1, (2026, 7, 1), "Monthly Salary", 4200.00, TxnKind::Income, "Income"),
        txn(2, (2026, 7, 1), "Rent - Maple St Apartment", 1450.00, TxnKind::Expense, "Housing"),
        txn(3, (2026, 7, 3), "Corner Coffee Shop", 6.50, TxnKind::Expense, UNCATEGORIZED),
        txn(4, (2026, 7, 5), "City Transit Pass", 64.00, TxnKind::Expense, "Transportation"),
        txn(5, (2026, 7, 8), "Grocery Mart", 112.37, TxnKind::Expense, UNCATEGORIZED),
        txn(6, (2026, 7, 12), "Streaming Subscription", 15.99, TxnKind::Expense, "Entertainment"),
        txn(7, (2026, 7, 15), "Electric Utility", 88.20, TxnKind::Expense, "Utilities"),
        txn(8, (2026, 7, 21), "Freelance Invoice #114", 650.00, TxnKind::Income, UNCATEGORIZED),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_has_uncategorized_work() {
        let txns = seed_transactions();
        assert!(txns.iter().any(|t| t.is_uncategorized()));
        assert!(txns.iter().all(|t| t.amount >= 0.0));
    }
}
