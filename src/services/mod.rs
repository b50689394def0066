//! Services module - Flussi applicativi sopra gli store
//!
//! Il livello di presentazione parla solo con il controller, che compone gli store.

pub mod conversation;

// Re-exports per facilitare l'import
pub use conversation::{CANNED_REPLIES, ChatView, ConversationController, ReadReceipt};
