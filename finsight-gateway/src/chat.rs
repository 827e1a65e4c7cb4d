//! The conversational session: an explicitly owned object holding the turn
//! history for one streaming exchange at a time.

use finsight_core::Transaction;

use crate::client::{ChatTurn, LlmClient, StreamEvent};
use crate::error::GatewayResult;
use crate::insights::INSIGHTS_BATCH_LIMIT;

/// System prompt for the finance copilot, grounded in the user's current
/// transaction list (bounded the same way the insight prompt is).
pub fn finance_system_prompt(txns: &[Transaction]) -> String {
    let mut prompt = String::from(
        "You are a personal-finance assistant. Answer questions about the \
         user's transactions below. Be concise and concrete; use dollar \
         amounts from the data rather than guesses. If the answer is not in \
         the data, say so.\n\nTransactions:\n",
    );
    for t in txns.iter().take(INSIGHTS_BATCH_LIMIT) {
        prompt.push_str(&format!(
            "{}: {} (${:.2}) - {}\n",
            t.date, t.description, t.amount, t.category
        ));
    }
    prompt
}

/// One conversation with the model. Construct it where it is used, pass it
/// by `&mut`, and drop it to dispose — there is no global session.
pub struct ChatSession {
    client: LlmClient,
    system: String,
    turns: Vec<ChatTurn>,
    max_turns_context: usize,
}

impl ChatSession {
    pub fn new(client: LlmClient, system: String, max_turns_context: usize) -> Self {
        Self { client, system, turns: Vec::new(), max_turns_context }
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Send one user message, forwarding each partial chunk to `on_delta`,
    /// and return the full reply text. On failure the user turn is removed
    /// again so a retry re-sends a clean history.
    pub async fn send(
        &mut self,
        user_text: &str,
        mut on_delta: impl FnMut(&str) + Send,
    ) -> GatewayResult<String> {
        self.turns.push(ChatTurn::user(user_text));

        // Only the most recent turns go over the wire.
        let start = self.turns.len().saturating_sub(self.max_turns_context);
        let window = self.turns[start..].to_vec();

        let mut full = String::new();
        let result = self
            .client
            .stream_generate(&self.system, &window, |ev| {
                if let StreamEvent::Delta(chunk) = ev {
                    full.push_str(&chunk);
                    on_delta(&chunk);
                }
            })
            .await;

        match result {
            Ok(()) => {
                self.turns.push(ChatTurn::model(full.clone()));
                Ok(full)
            }
            Err(e) => {
                self.turns.pop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finsight_core::TxnKind;

    #[test]
    fn test_system_prompt_embeds_transactions() {
        let txns = vec![Transaction {
            id: "txn-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            description: "Grocery Mart".to_string(),
            amount: 112.37,
            kind: TxnKind::Expense,
            category: "Food & Dining".to_string(),
            anomaly: None,
        }];
        let prompt = finance_system_prompt(&txns);
        assert!(prompt.contains("2026-03-01: Grocery Mart ($112.37) - Food & Dining"));
    }

    #[test]
    fn test_session_starts_empty() {
        let client = LlmClient::new("http://localhost", "test-model", "key", 0.4);
        let session = ChatSession::new(client, "system".to_string(), 12);
        assert_eq!(session.turn_count(), 0);
    }
}
