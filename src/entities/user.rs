//! User entity - Entità utente con presenza derivata da `last_seen`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub status: String,
    pub last_seen: DateTime<Utc>,
}

impl User {
    /// Online se visto entro `window` da `now`. La presenza non viene mai salvata.
    pub fn is_online_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let elapsed = now.signed_duration_since(self.last_seen);
        match elapsed.to_std() {
            Ok(elapsed) => elapsed < window,
            // last_seen nel futuro (orologi sfasati): consideriamo l'utente online
            Err(_) => true,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.display_name.to_lowercase().contains(&needle)
            || self.phone_number.contains(query.trim())
    }
}
