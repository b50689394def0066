//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};

// ********************* ENUMERAZIONI UTILI **********************//

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Individual,
    Group,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    Voice,
}

impl MessageType {
    /// Tutti i tipi diversi da `Text` richiedono un `media_url`
    pub fn requires_media(&self) -> bool {
        !matches!(self, MessageType::Text)
    }

    /// Testo mostrato nella lista chat al posto del nome del file
    pub fn preview(&self) -> Option<&'static str> {
        match self {
            MessageType::Text => None,
            MessageType::Image => Some("Photo"),
            MessageType::File => Some("File"),
            MessageType::Voice => Some("Voice message"),
        }
    }
}

/// Stato di consegna. L'ordine delle varianti è quello della macchina a stati:
/// sent < delivered < read.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Read)
    }

    /// Stato risultante da una transizione monotona verso `target`
    pub fn advance_to(self, target: MessageStatus) -> MessageStatus {
        self.max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_never_regresses() {
        assert_eq!(
            MessageStatus::Read.advance_to(MessageStatus::Delivered),
            MessageStatus::Read
        );
        assert_eq!(
            MessageStatus::Sent.advance_to(MessageStatus::Delivered),
            MessageStatus::Delivered
        );
        assert!(MessageStatus::Read.is_terminal());
    }

    #[test]
    fn test_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&MessageType::Voice).unwrap(), "\"voice\"");
        assert_eq!(
            serde_json::from_str::<MessageStatus>("\"delivered\"").unwrap(),
            MessageStatus::Delivered
        );
        assert_eq!(serde_json::to_string(&ChatType::Individual).unwrap(), "\"individual\"");
    }
}
