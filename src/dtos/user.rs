//! User DTOs - Data Transfer Objects per utenti

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    // prefisso opzionale, poi cifre con spazi, trattini o parentesi
    static ref PHONE_NUMBER: Regex = Regex::new(r"^\+?[0-9][0-9 ()\-]{5,19}$").unwrap();
}

fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if PHONE_NUMBER.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_number");
        err.message = Some("Phone number must contain 6 to 20 digits or separators".into());
        Err(err)
    }
}

/// DTO per creare un nuovo utente (senza id e last_seen)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDTO {
    #[validate(length(min = 1, max = 64, message = "Display name must be between 1 and 64 characters"))]
    pub display_name: String,

    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: String,

    pub avatar: Option<String>,
    pub status: Option<String>,
}

/// DTO per aggiornare un utente (solo campi `Some`)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDTO {
    #[validate(length(min = 1, max = 64, message = "Display name must be between 1 and 64 characters"))]
    pub display_name: Option<String>,

    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,

    pub avatar: Option<String>,
    pub status: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
}
