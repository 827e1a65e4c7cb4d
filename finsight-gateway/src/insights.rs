//! Spending insights: one free-text call over a bounded slice of the
//! transaction list.

use finsight_core::Transaction;

use crate::client::LlmClient;
use crate::error::{GatewayError, GatewayResult};

/// Token-budget guard: only this many transactions are ever embedded in the
/// prompt. Truncation, not sampling.
pub const INSIGHTS_BATCH_LIMIT: usize = 50;

pub const NO_INSIGHTS_MESSAGE: &str = "No insights available for these transactions yet.";

pub const INSIGHTS_BUSY_MESSAGE: &str =
    "The insights service is handling too many requests. Try again in a minute.";

pub const INSIGHTS_UNAVAILABLE_MESSAGE: &str =
    "Sorry, insights could not be generated right now. Try again later.";

pub fn build_insights_prompt(txns: &[Transaction]) -> String {
    let mut prompt = String::from(
        "Here are my recent transactions. Point out anything worth knowing \
         about my spending in at most 3 short bullet points.\n\n",
    );
    for t in txns.iter().take(INSIGHTS_BATCH_LIMIT) {
        prompt.push_str(&format!(
            "{}: {} (${:.2}) - {}\n",
            t.date, t.description, t.amount, t.category
        ));
    }
    prompt
}

/// Ask for insights over (the first `INSIGHTS_BATCH_LIMIT` of) `txns`.
/// An empty response is no data, not an error.
pub async fn insights(client: &LlmClient, txns: &[Transaction]) -> GatewayResult<String> {
    let prompt = build_insights_prompt(txns);
    let text = client.generate(&prompt, None).await?;
    if text.trim().is_empty() {
        return Ok(NO_INSIGHTS_MESSAGE.to_string());
    }
    Ok(text)
}

/// What the insights pane shows, plus whether the throttled hint applies.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsView {
    pub text: String,
    pub rate_limited: bool,
}

/// Map a call outcome to display state. Failures collapse to fixed strings
/// here, at the edge, so the gateway result keeps the full classification.
pub fn render_outcome(result: GatewayResult<String>) -> InsightsView {
    match result {
        Ok(text) => InsightsView { text, rate_limited: false },
        Err(GatewayError::RateLimited) => {
            InsightsView { text: INSIGHTS_BUSY_MESSAGE.to_string(), rate_limited: true }
        }
        Err(GatewayError::Remote(e)) => {
            log::warn!("insight call failed: {e:#}");
            InsightsView { text: INSIGHTS_UNAVAILABLE_MESSAGE.to_string(), rate_limited: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finsight_core::TxnKind;

    fn txn(seq: usize) -> Transaction {
        Transaction {
            id: format!("txn-{seq}"),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            description: format!("Merchant {seq}"),
            amount: 10.0,
            kind: TxnKind::Expense,
            category: "Shopping".to_string(),
            anomaly: None,
        }
    }

    #[test]
    fn test_prompt_truncates_to_batch_limit() {
        let txns: Vec<Transaction> = (0..200).map(txn).collect();
        let prompt = build_insights_prompt(&txns);
        let rows = prompt.lines().filter(|l| l.contains("Merchant")).count();
        assert_eq!(rows, INSIGHTS_BATCH_LIMIT);
        assert!(prompt.contains("Merchant 49 "));
        assert!(!prompt.contains("Merchant 50 "));
    }

    #[test]
    fn test_prompt_line_format() {
        let prompt = build_insights_prompt(&[txn(1)]);
        assert!(prompt.contains("2026-03-01: Merchant 1 ($10.00) - Shopping"));
    }

    #[test]
    fn test_rate_limit_outcome_sets_flag_and_busy_text() {
        let view = render_outcome(Err(GatewayError::RateLimited));
        assert!(view.rate_limited);
        assert_eq!(view.text, INSIGHTS_BUSY_MESSAGE);
    }

    #[test]
    fn test_other_failure_outcome_is_apologetic_and_unflagged() {
        let view = render_outcome(Err(GatewayError::Remote(anyhow::anyhow!("boom"))));
        assert!(!view.rate_limited);
        assert_eq!(view.text, INSIGHTS_UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_success_outcome_passes_text_through() {
        let view = render_outcome(Ok("- spend less on coffee".to_string()));
        assert!(!view.rate_limited);
        assert_eq!(view.text, "- spend less on coffee");
    }
}
