//! finsight-core: Transaction and chat-message types, category set, and the
//! persisted transaction store.

pub mod chat;
pub mod seed;
pub mod store;
pub mod transaction;

pub use chat::{
    apply_chat_event, ChatMessage, ChatStreamEvent, MessageState, Role, GENERIC_FAILURE_MESSAGE,
    RATE_LIMIT_MESSAGE,
};
pub use store::{Summary, TransactionStore};
pub use transaction::{
    is_known_category, CategoryAssignment, StatementRow, Transaction, TxnKind,
    UnknownCategoryPolicy, CATEGORIES, UNCATEGORIZED,
};
