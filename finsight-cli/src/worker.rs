//! Background gateway worker. The UI event loop stays single-threaded;
//! every remote call runs here and reports back over a channel.
//!
//! Requests are tagged with a generation counter. The worker handles one
//! request at a time; the UI discards events whose request id is not the
//! current generation, so a response that outlives the request that wanted
//! it can never touch state it no longer owns.

use std::sync::mpsc::Sender;
use tokio::sync::mpsc::UnboundedReceiver;

use finsight_core::{CategoryAssignment, Transaction};
use finsight_gateway::{
    categorize, finance_system_prompt, insights, render_outcome, ChatSession, InsightsView,
    LlmClient,
};

#[derive(Debug, Clone)]
pub enum GatewayRequest {
    Categorize { request_id: u64, txns: Vec<Transaction> },
    Insights { request_id: u64, txns: Vec<Transaction> },
    Chat { request_id: u64, message_id: u64, text: String, context: Vec<Transaction> },
}

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Started { request_id: u64 },
    ChatDelta { request_id: u64, message_id: u64, text: String },
    ChatCompleted { request_id: u64, message_id: u64 },
    ChatFailed { request_id: u64, message_id: u64, rate_limited: bool },
    Categorized { request_id: u64, assignments: Vec<CategoryAssignment> },
    CategorizeFailed { request_id: u64, rate_limited: bool },
    Insights { request_id: u64, view: InsightsView },
}

impl GatewayEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            GatewayEvent::Started { request_id }
            | GatewayEvent::ChatDelta { request_id, .. }
            | GatewayEvent::ChatCompleted { request_id, .. }
            | GatewayEvent::ChatFailed { request_id, .. }
            | GatewayEvent::Categorized { request_id, .. }
            | GatewayEvent::CategorizeFailed { request_id, .. }
            | GatewayEvent::Insights { request_id, .. } => *request_id,
        }
    }
}

pub async fn run_worker(
    client: LlmClient,
    max_turns_context: usize,
    mut rx: UnboundedReceiver<GatewayRequest>,
    tx: Sender<GatewayEvent>,
) {
    // The chat session is created on first use and lives as long as the
    // worker; dropping the worker disposes it.
    let mut session: Option<ChatSession> = None;

    while let Some(req) = rx.recv().await {
        match req {
            GatewayRequest::Categorize { request_id, txns } => {
                let _ = tx.send(GatewayEvent::Started { request_id });
                let event = match categorize(&client, &txns).await {
                    Ok(assignments) => GatewayEvent::Categorized { request_id, assignments },
                    Err(e) => {
                        log::warn!("categorize request failed: {e}");
                        GatewayEvent::CategorizeFailed {
                            request_id,
                            rate_limited: e.is_rate_limited(),
                        }
                    }
                };
                let _ = tx.send(event);
            }

            GatewayRequest::Insights { request_id, txns } => {
                let _ = tx.send(GatewayEvent::Started { request_id });
                let view = render_outcome(insights(&client, &txns).await);
                let _ = tx.send(GatewayEvent::Insights { request_id, view });
            }

            GatewayRequest::Chat { request_id, message_id, text, context } => {
                let _ = tx.send(GatewayEvent::Started { request_id });

                let session = session.get_or_insert_with(|| {
                    ChatSession::new(
                        client.clone(),
                        finance_system_prompt(&context),
                        max_turns_context,
                    )
                });

                let delta_tx = tx.clone();
                let result = session
                    .send(&text, move |chunk| {
                        let _ = delta_tx.send(GatewayEvent::ChatDelta {
                            request_id,
                            message_id,
                            text: chunk.to_string(),
                        });
                    })
                    .await;

                let event = match result {
                    Ok(_) => GatewayEvent::ChatCompleted { request_id, message_id },
                    Err(e) => {
                        log::warn!("chat request failed: {e}");
                        GatewayEvent::ChatFailed {
                            request_id,
                            message_id,
                            rate_limited: e.is_rate_limited(),
                        }
                    }
                };
                let _ = tx.send(event);
            }
        }
    }
}
