//! Chat entity - Entità chat con snapshot denormalizzato dell'ultimo messaggio

use super::enums::{ChatType, MessageStatus};
use super::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Discriminante della chat. I campi di gruppo esistono solo per `Group`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatKind {
    Individual,
    Group {
        #[serde(rename = "groupName")]
        group_name: String,
        #[serde(rename = "groupAvatar", default)]
        group_avatar: Option<String>,
    },
}

impl ChatKind {
    pub fn chat_type(&self) -> ChatType {
        match self {
            ChatKind::Individual => ChatType::Individual,
            ChatKind::Group { .. } => ChatType::Group,
        }
    }
}

/// I partecipanti sono un insieme di id: nessun duplicato, esattamente due per le chat
/// individuali, almeno due per i gruppi. In caso di errore restituisce il messaggio.
pub fn check_participants(chat_type: ChatType, participants: &[String]) -> Result<(), &'static str> {
    let distinct: HashSet<&str> = participants.iter().map(String::as_str).collect();
    let unique = distinct.len() == participants.len();
    match chat_type {
        ChatType::Individual if !unique || distinct.len() != 2 => {
            Err("Individual chats need exactly two distinct participants")
        }
        ChatType::Group if !unique || distinct.len() < 2 => {
            Err("Group chats need at least two distinct participants")
        }
        _ => Ok(()),
    }
}

/// Copia dei campi dell'ultimo messaggio, non un riferimento vivo:
/// va aggiornata esplicitamente ad ogni nuovo messaggio.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sender_id: String,
    pub status: MessageStatus,
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            content: message.preview_content(),
            timestamp: message.timestamp,
            sender_id: message.sender_id.clone(),
            status: message.status,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(flatten)]
    pub kind: ChatKind,
    pub participants: Vec<String>,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn chat_type(&self) -> ChatType {
        self.kind.chat_type()
    }

    pub fn is_individual(&self) -> bool {
        matches!(self.kind, ChatKind::Individual)
    }

    pub fn group_name(&self) -> Option<&str> {
        match &self.kind {
            ChatKind::Group { group_name, .. } => Some(group_name),
            ChatKind::Individual => None,
        }
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// Il primo partecipante diverso da `user_id`
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        self.participants
            .iter()
            .map(String::as_str)
            .find(|p| *p != user_id)
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.timestamp)
    }
}
