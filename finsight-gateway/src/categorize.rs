//! Batch categorization: one prompt for every uncategorized transaction,
//! one structured JSON record back per id.

use serde_json::{json, Value};

use finsight_core::{CategoryAssignment, Transaction, CATEGORIES};

use crate::client::LlmClient;
use crate::error::GatewayResult;

pub fn build_categorize_prompt(txns: &[Transaction]) -> String {
    let mut prompt = String::from(
        "You are a personal-finance assistant. Assign a category to each \
         transaction below.\n\n",
    );
    prompt.push_str(&format!("Allowed categories: {}.\n\n", CATEGORIES.join(", ")));
    prompt.push_str(
        "Return a JSON array with exactly one object per input id. For each \
         transaction pick one category from the allowed list, and set \
         isAnomaly to true when the amount looks unusually high for that \
         kind of spending.\n\nTransactions:\n",
    );
    for t in txns {
        prompt.push_str(&format!(
            "- id: {} | description: {} | amount: {:.2} | type: {}\n",
            t.id,
            t.description,
            t.amount,
            t.kind.label()
        ));
    }
    prompt
}

/// Structured-output schema for the categorize call: an array of
/// `{id, category, isAnomaly}` objects, all fields required.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "category": { "type": "STRING", "enum": CATEGORIES },
                "isAnomaly": { "type": "BOOLEAN" }
            },
            "required": ["id", "category", "isAnomaly"]
        }
    })
}

/// Ask the model to categorize `txns`. Rate limits propagate as
/// `GatewayError::RateLimited`; other remote failures as `Remote`. A
/// response that cannot be parsed is no data: an empty assignment list,
/// which leaves every transaction unchanged once merged.
pub async fn categorize(
    client: &LlmClient,
    txns: &[Transaction],
) -> GatewayResult<Vec<CategoryAssignment>> {
    if txns.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_categorize_prompt(txns);
    let text = client.generate(&prompt, Some(response_schema())).await?;

    match serde_json::from_str::<Vec<CategoryAssignment>>(&text) {
        Ok(assignments) => Ok(assignments),
        Err(e) => {
            log::warn!("categorize response was not a valid assignment array: {e}");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finsight_core::{TxnKind, UNCATEGORIZED};

    fn txn(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            description: "Corner Coffee Shop".to_string(),
            amount: 6.5,
            kind: TxnKind::Expense,
            category: UNCATEGORIZED.to_string(),
            anomaly: None,
        }
    }

    #[test]
    fn test_prompt_embeds_every_transaction_and_the_category_set() {
        let prompt = build_categorize_prompt(&[txn("txn-1"), txn("txn-2")]);
        assert!(prompt.contains("id: txn-1"));
        assert!(prompt.contains("id: txn-2"));
        assert!(prompt.contains("amount: 6.50"));
        assert!(prompt.contains("type: expense"));
        for c in CATEGORIES {
            assert!(prompt.contains(c), "missing category {c}");
        }
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert_eq!(schema["items"]["properties"]["isAnomaly"]["type"], "BOOLEAN");
    }
}
