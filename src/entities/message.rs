//! Message entity - Entità messaggio

use super::enums::{MessageStatus, MessageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    // può essere vuoto per i messaggi multimediali
    pub content: String,
    // campo rinominato perchè type è una parola riservata
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub media_url: Option<String>,
}

impl Message {
    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    /// Contenuto da usare nello snapshot `last_message` della chat
    pub fn preview_content(&self) -> String {
        self.message_type
            .preview()
            .map(str::to_string)
            .unwrap_or_else(|| self.content.clone())
    }
}
