//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Configurazione
//! - Gestione errori
//! - Latenze simulate
//! - Stato applicazione

pub mod config;
pub mod error;
pub mod latency;
pub mod state;

// Re-exports per facilitare l'import
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
