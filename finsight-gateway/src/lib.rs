//! finsight-gateway: the boundary between the dashboard and the remote
//! generative-language service. Wraps three calls — batch categorize,
//! insights, and streaming chat — and classifies their failures.

pub mod categorize;
pub mod chat;
pub mod client;
pub mod error;
pub mod insights;

pub use categorize::categorize;
pub use chat::{finance_system_prompt, ChatSession};
pub use client::{ChatTurn, LlmClient, StreamEvent};
pub use error::{is_rate_limit, GatewayError, GatewayResult};
pub use insights::{insights, render_outcome, InsightsView};
