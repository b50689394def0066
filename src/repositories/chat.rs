//! ChatRepository - Repository per la gestione delle chat

use super::collection::{Collection, Entity};
use super::{Create, Delete, Read, ReadAll, Update};
use crate::core::AppError;
use crate::core::latency::{Latency, Op};
use crate::dtos::{CreateChatDTO, UpdateChatDTO};
use crate::entities::{Chat, ChatKind, LastMessage, MessageStatus, check_participants};
use chrono::Utc;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

impl Entity for Chat {
    const NOT_FOUND: &'static str = "Chat not found";

    fn id(&self) -> &str {
        &self.id
    }
}

// CHAT REPOSITORY
pub struct ChatRepository {
    chats: Collection<Chat>,
}

impl ChatRepository {
    pub fn new(seed: Vec<Chat>, latency: Latency) -> Self {
        Self {
            chats: Collection::new(seed, latency),
        }
    }

    /// Azzera il contatore dei non letti. Se l'ultimo messaggio è stato inviato da un
    /// altro utente, aggiorna anche lo status dello snapshot a `read`.
    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, chat_id: &str, reader_id: &str) -> Result<Chat, AppError> {
        let _turn = self.chats.sequence(chat_id).await;
        self.chats.pause(Op::MarkAsRead).await;
        let chat = self
            .chats
            .modify(chat_id, |chat| {
                chat.unread_count = 0;
                if let Some(last) = chat.last_message.as_mut() {
                    if last.sender_id != reader_id {
                        last.status = last.status.advance_to(MessageStatus::Read);
                    }
                }
                Ok(())
            })
            .await?;
        debug!("Unread counter reset");
        Ok(chat)
    }

    #[instrument(skip(self))]
    pub async fn update_unread_count(&self, chat_id: &str, count: u32) -> Result<Chat, AppError> {
        let _turn = self.chats.sequence(chat_id).await;
        self.chats.pause(Op::UpdateUnread).await;
        self.chats
            .modify(chat_id, |chat| {
                chat.unread_count = count;
                Ok(())
            })
            .await
    }

    /// Incrementa di uno i non letti, usato quando arriva un messaggio in una chat non aperta
    #[instrument(skip(self))]
    pub async fn increment_unread(&self, chat_id: &str) -> Result<Chat, AppError> {
        let _turn = self.chats.sequence(chat_id).await;
        self.chats.pause(Op::UpdateUnread).await;
        self.chats
            .modify(chat_id, |chat| {
                chat.unread_count = chat.unread_count.saturating_add(1);
                Ok(())
            })
            .await
    }

    /// Sostituisce lo snapshot dell'ultimo messaggio. Uno snapshot più vecchio di quello
    /// salvato viene ignorato, così due invii concorrenti non possono farlo regredire.
    /// `unread_count`, se presente, viene scritto nello stesso passo.
    #[instrument(skip(self, snapshot), fields(message_id = %snapshot.id))]
    pub async fn refresh_last_message(
        &self,
        chat_id: &str,
        snapshot: LastMessage,
        unread_count: Option<u32>,
    ) -> Result<Chat, AppError> {
        let _turn = self.chats.sequence(chat_id).await;
        self.chats.pause(Op::Update).await;
        self.chats
            .modify(chat_id, |chat| {
                let newer = chat
                    .last_message
                    .as_ref()
                    .is_none_or(|current| current.timestamp <= snapshot.timestamp);
                if newer {
                    chat.last_message = Some(snapshot);
                } else {
                    debug!("Stale snapshot ignored");
                }
                if let Some(count) = unread_count {
                    chat.unread_count = count;
                }
                Ok(())
            })
            .await
    }

    /// Get individual chat between two users (if exists)
    #[instrument(skip(self), fields(user1 = %user1_id, user2 = %user2_id))]
    pub async fn find_individual_between(
        &self,
        user1_id: &str,
        user2_id: &str,
    ) -> Result<Option<Chat>, AppError> {
        debug!("Finding individual chat between two users");
        self.chats.pause(Op::GetAll).await;
        let found = self
            .chats
            .filter(|c| c.is_individual() && c.has_participant(user1_id) && c.has_participant(user2_id))
            .await
            .into_iter()
            .next();

        if found.is_some() {
            debug!("Individual chat found");
        } else {
            debug!("No individual chat found");
        }
        Ok(found)
    }
}

/// Ordine della lista chat: ultima attività più recente prima, chat senza messaggi in fondo
fn by_last_activity(a: &Chat, b: &Chat) -> Ordering {
    match (a.last_activity(), b.last_activity()) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Create<Chat, CreateChatDTO> for ChatRepository {
    #[instrument(skip(self, data), fields(chat_type = ?data.chat_type))]
    async fn create(&self, data: &CreateChatDTO) -> Result<Chat, AppError> {
        debug!("Creating new chat");
        data.validate()?;
        let kind = data.kind()?;

        self.chats.pause(Op::Create).await;

        let chat = Chat {
            id: self.chats.next_id(),
            kind,
            participants: data.participants.clone(),
            last_message: None,
            unread_count: 0,
            created_at: Utc::now(),
        };
        let chat = self.chats.insert(chat).await;

        info!("Chat created with id {}", chat.id);
        Ok(chat)
    }
}

impl Read<Chat> for ChatRepository {
    #[instrument(skip(self), fields(chat_id = %id))]
    async fn get_by_id(&self, id: &str) -> Result<Chat, AppError> {
        debug!("Reading chat by id");
        self.chats.pause(Op::GetById).await;
        self.chats.find(id).await
    }
}

impl ReadAll<Chat> for ChatRepository {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Chat>, AppError> {
        self.chats.pause(Op::GetAll).await;
        let mut chats = self.chats.snapshot().await;
        // sort stabile: a parità di attività resta l'ordine di inserimento
        chats.sort_by(by_last_activity);
        debug!("Returning {} chats", chats.len());
        Ok(chats)
    }
}

impl Update<Chat, UpdateChatDTO> for ChatRepository {
    #[instrument(skip(self, data), fields(chat_id = %id))]
    async fn update(&self, id: &str, data: &UpdateChatDTO) -> Result<Chat, AppError> {
        debug!("Updating chat");
        data.validate()?;

        let _turn = self.chats.sequence(id).await;
        self.chats.pause(Op::Update).await;

        self.chats
            .modify(id, |chat| {
                if let Some(participants) = &data.participants {
                    if let Err(message) = check_participants(chat.chat_type(), participants) {
                        warn!("Rejected participant change: {}", message);
                        return Err(AppError::validation(message));
                    }
                    chat.participants = participants.clone();
                }
                if let Some(last_message) = &data.last_message {
                    chat.last_message = Some(last_message.clone());
                }
                if let Some(unread_count) = data.unread_count {
                    chat.unread_count = unread_count;
                }
                if data.touches_group_fields() {
                    match &mut chat.kind {
                        ChatKind::Group {
                            group_name,
                            group_avatar,
                        } => {
                            if let Some(name) = &data.group_name {
                                *group_name = name.clone();
                            }
                            if let Some(avatar) = &data.group_avatar {
                                *group_avatar = Some(avatar.clone());
                            }
                        }
                        ChatKind::Individual => {
                            return Err(AppError::validation(
                                "Group fields are only allowed on group chats",
                            ));
                        }
                    }
                }
                Ok(())
            })
            .await
    }
}

impl Delete for ChatRepository {
    #[instrument(skip(self), fields(chat_id = %id))]
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let _turn = self.chats.sequence(id).await;
        self.chats.pause(Op::Delete).await;
        self.chats.remove(id).await?;
        info!("Chat deleted");
        Ok(())
    }
}
