//! Message DTOs - Data Transfer Objects per messaggi

use crate::entities::{MessageStatus, MessageType};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// DTO per creare un nuovo messaggio (senza id, timestamp e status)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_media_url"))]
pub struct CreateMessageDTO {
    pub chat_id: String,
    pub sender_id: String,

    // niente minimo: i messaggi multimediali possono avere contenuto vuoto
    #[validate(length(max = 5000, message = "Message content must be at most 5000 characters"))]
    pub content: String,

    #[serde(rename = "type", default)]
    pub message_type: MessageType,

    pub media_url: Option<String>,
}

impl CreateMessageDTO {
    pub fn text(
        chat_id: impl Into<String>,
        sender_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
            content: content.into(),
            message_type: MessageType::Text,
            media_url: None,
        }
    }
}

fn validate_media_url(dto: &CreateMessageDTO) -> Result<(), ValidationError> {
    let has_media = dto.media_url.as_deref().is_some_and(|url| !url.is_empty());
    if dto.message_type.requires_media() != has_media {
        let mut err = ValidationError::new("media_url");
        err.message = Some("mediaUrl is required for media messages and only for them".into());
        return Err(err);
    }
    Ok(())
}

/// DTO per aggiornare un messaggio (operazione grezza: lo status può anche regredire)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageDTO {
    #[validate(length(max = 5000, message = "Message content must be at most 5000 characters"))]
    pub content: Option<String>,
    pub status: Option<MessageStatus>,
    pub media_url: Option<String>,
}

/// File scelto dall'utente per un messaggio multimediale
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub url: String,
}

impl MediaFile {
    /// Tipo del messaggio in base al MIME type del file
    pub fn message_type(&self) -> MessageType {
        let mime = self.mime_type.to_ascii_lowercase();
        if mime.starts_with("image/") {
            MessageType::Image
        } else if mime.starts_with("audio/") {
            MessageType::Voice
        } else {
            MessageType::File
        }
    }
}
