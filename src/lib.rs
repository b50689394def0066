//! Chat core library - store in memoria e controller delle conversazioni

pub mod core;
pub mod dtos;
pub mod entities;
pub mod events;
pub mod repositories;
pub mod seed;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use core::{AppError, AppState, Config};
pub use events::{ChatEvent, EventHub};
pub use seed::Seed;
pub use services::ConversationController;
