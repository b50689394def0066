//! Error - Tassonomia degli errori restituiti da store e controller

use serde::Serialize;
use thiserror::Error;

/// Categoria dell'errore. `NotFound` è l'unico caso prodotto dai flussi normali,
/// gli altri coprono input malformati e seed corrotti.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", suffix(.details))]
pub struct AppError {
    kind: ErrorKind,
    message: &'static str,
    details: Option<String>,
}

fn suffix(details: &Option<String>) -> String {
    details.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl AppError {
    pub fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Common error constructors
    pub fn not_found(message: &'static str) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: &'static str) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn conflict(message: &'static str) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: &'static str) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::validation("Validation error").with_details(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal("Malformed seed data").with_details(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal("Unable to read seed data").with_details(err.to_string())
    }
}
