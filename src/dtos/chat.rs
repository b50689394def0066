//! Chat DTOs - Data Transfer Objects per chat

use crate::core::AppError;
use crate::entities::{ChatKind, ChatType, LastMessage, check_participants};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO per creare una nuova chat (senza id, last_message e contatori)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatDTO {
    #[serde(rename = "type", default = "default_chat_type")]
    pub chat_type: ChatType,

    #[validate(length(min = 2, message = "A chat needs at least two participants"))]
    pub participants: Vec<String>,

    #[validate(length(min = 1, max = 100, message = "Group name must be between 1 and 100 characters"))]
    pub group_name: Option<String>,

    pub group_avatar: Option<String>,
}

fn default_chat_type() -> ChatType {
    ChatType::Individual
}

impl CreateChatDTO {
    pub fn individual(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            chat_type: ChatType::Individual,
            participants: vec![first.into(), second.into()],
            group_name: None,
            group_avatar: None,
        }
    }

    pub fn group(name: impl Into<String>, participants: Vec<String>) -> Self {
        Self {
            chat_type: ChatType::Group,
            participants,
            group_name: Some(name.into()),
            group_avatar: None,
        }
    }

    /// Costruisce il discriminante controllando i vincoli per tipo di chat
    pub fn kind(&self) -> Result<ChatKind, AppError> {
        check_participants(self.chat_type, &self.participants).map_err(AppError::validation)?;
        match self.chat_type {
            ChatType::Individual => {
                if self.group_name.is_some() || self.group_avatar.is_some() {
                    return Err(AppError::validation(
                        "Group fields are only allowed on group chats",
                    ));
                }
                Ok(ChatKind::Individual)
            }
            ChatType::Group => {
                let group_name = self
                    .group_name
                    .clone()
                    .ok_or_else(|| AppError::validation("Group chats need a name"))?;
                Ok(ChatKind::Group {
                    group_name,
                    group_avatar: self.group_avatar.clone(),
                })
            }
        }
    }
}

/// DTO per aggiornare una chat: merge superficiale dei soli campi `Some`
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatDTO {
    #[validate(length(min = 2, message = "A chat needs at least two participants"))]
    pub participants: Option<Vec<String>>,

    pub last_message: Option<LastMessage>,

    pub unread_count: Option<u32>,

    #[validate(length(min = 1, max = 100, message = "Group name must be between 1 and 100 characters"))]
    pub group_name: Option<String>,

    pub group_avatar: Option<String>,
}

impl UpdateChatDTO {
    pub fn touches_group_fields(&self) -> bool {
        self.group_name.is_some() || self.group_avatar.is_some()
    }
}
