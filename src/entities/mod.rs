//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) gestite dagli store in memoria.
//! I nomi dei campi JSON seguono il formato camelCase dei dati di seed.

pub mod chat;
pub mod enums;
pub mod message;
pub mod user;

// Re-exports per facilitare l'import
pub use chat::{Chat, ChatKind, LastMessage, check_participants};
pub use enums::{ChatType, MessageStatus, MessageType};
pub use message::Message;
pub use user::User;
