//! MessageRepository - Repository per la gestione dei messaggi
//!
//! Oltre al CRUD gestisce la transizione automatica sent -> delivered: ogni create
//! programma un task separato che la esegue dopo un ritardo fisso. Il task non viene
//! mai atteso dalla create e può essere annullato o anticipato tramite il suo handle.

use super::collection::{Collection, Entity};
use super::{Create, Delete, Read, ReadAll, Update};
use crate::core::AppError;
use crate::core::latency::{Latency, Op};
use crate::dtos::{CreateMessageDTO, UpdateMessageDTO};
use crate::entities::{Message, MessageStatus};
use crate::events::{ChatEvent, EventHub};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

impl Entity for Message {
    const NOT_FOUND: &'static str = "Message not found";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Handle della consegna programmata di un messaggio
#[derive(Debug, Clone)]
pub struct DeliveryHandle {
    message_id: String,
    abort: Arc<AbortHandle>,
}

impl DeliveryHandle {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Annulla la transizione se non è ancora avvenuta
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

// MESSAGE REPO
pub struct MessageRepository {
    messages: Arc<Collection<Message>>,
    delivery_delay: Option<Duration>,
    pending: Arc<DashMap<String, DeliveryHandle>>,
    events: EventHub,
}

impl MessageRepository {
    pub fn new(
        seed: Vec<Message>,
        latency: Latency,
        delivery_delay: Option<Duration>,
        events: EventHub,
    ) -> Self {
        Self {
            messages: Arc::new(Collection::new(seed, latency)),
            delivery_delay,
            pending: Arc::new(DashMap::new()),
            events,
        }
    }

    /// Get all messages for a specific chat, ordered by timestamp (oldest first)
    #[instrument(skip(self))]
    pub async fn get_by_chat_id(&self, chat_id: &str) -> Result<Vec<Message>, AppError> {
        self.messages.pause(Op::GetByChatId).await;
        let mut messages = self.messages.filter(|m| m.chat_id == chat_id).await;
        messages.sort_by_key(|m| m.timestamp);
        debug!("Retrieved {} messages for chat", messages.len());
        Ok(messages)
    }

    /// Avanza lo status del messaggio verso `status`. Non regredisce mai:
    /// chiedere `delivered` per un messaggio già `read` lo lascia `read`.
    #[instrument(skip(self), fields(message_id = %id))]
    pub async fn update_status(&self, id: &str, status: MessageStatus) -> Result<Message, AppError> {
        advance_status(&self.messages, &self.events, id, status).await
    }

    /// Marca come letti tutti i messaggi della chat non inviati da `reader_id`.
    /// Restituisce i messaggi effettivamente cambiati; una seconda chiamata non cambia nulla.
    #[instrument(skip(self))]
    pub async fn mark_messages_as_read(
        &self,
        chat_id: &str,
        reader_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        self.messages.pause(Op::MarkAsRead).await;
        let changed = self
            .messages
            .modify_where(
                |m| m.chat_id == chat_id && !m.is_from(reader_id),
                |m| {
                    if m.status.is_terminal() {
                        return false;
                    }
                    // leggere implica la consegna
                    m.status = MessageStatus::Read;
                    true
                },
            )
            .await;

        for message in &changed {
            if let Some((_, handle)) = self.pending.remove(&message.id) {
                handle.cancel();
            }
            self.events.publish(ChatEvent::MessageStatusChanged {
                message_id: message.id.clone(),
                chat_id: message.chat_id.clone(),
                status: message.status,
            });
        }

        info!("{} messages marked as read", changed.len());
        Ok(changed)
    }

    /// Handle della consegna ancora in attesa per il messaggio, se presente
    pub fn delivery_handle(&self, message_id: &str) -> Option<DeliveryHandle> {
        self.pending.get(message_id).map(|entry| entry.value().clone())
    }

    pub fn pending_deliveries(&self) -> usize {
        self.pending.len()
    }

    /// Annulla la consegna automatica. Restituisce false se non c'era nulla da annullare.
    #[instrument(skip(self))]
    pub fn cancel_delivery(&self, message_id: &str) -> bool {
        match self.pending.remove(message_id) {
            Some((_, handle)) => {
                handle.cancel();
                debug!("Scheduled delivery of {} cancelled", handle.message_id());
                true
            }
            None => false,
        }
    }

    /// Esegue subito la consegna, annullando il task programmato
    #[instrument(skip(self))]
    pub async fn deliver_now(&self, message_id: &str) -> Result<Message, AppError> {
        self.cancel_delivery(message_id);
        advance_status(&self.messages, &self.events, message_id, MessageStatus::Delivered).await
    }

    fn schedule_delivery(&self, message: &Message) {
        let Some(delay) = self.delivery_delay else {
            return;
        };

        let messages = Arc::clone(&self.messages);
        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        let message_id = message.id.clone();
        let (ready_tx, ready_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            // parte solo quando l'handle è già in `pending`
            if ready_rx.await.is_err() {
                return;
            }
            tokio::time::sleep(delay).await;
            pending.remove(&message_id);
            if let Err(e) =
                advance_status(&messages, &events, &message_id, MessageStatus::Delivered).await
            {
                // il messaggio può essere stato cancellato nel frattempo
                warn!("Automatic delivery of message {} failed: {}", message_id, e);
            }
        });

        self.pending.insert(
            message.id.clone(),
            DeliveryHandle {
                message_id: message.id.clone(),
                abort: Arc::new(task.abort_handle()),
            },
        );
        if ready_tx.send(()).is_err() {
            warn!("Delivery task for message {} ended early", message.id);
        }
        debug!("Delivery scheduled in {}ms", delay.as_millis());
    }
}

async fn advance_status(
    messages: &Collection<Message>,
    events: &EventHub,
    id: &str,
    status: MessageStatus,
) -> Result<Message, AppError> {
    let _turn = messages.sequence(id).await;
    messages.pause(Op::UpdateStatus).await;

    let mut changed = false;
    let message = messages
        .modify(id, |m| {
            let next = m.status.advance_to(status);
            changed = next != m.status;
            m.status = next;
            Ok(())
        })
        .await?;

    if changed {
        debug!("Message {} is now {:?}", message.id, message.status);
        events.publish(ChatEvent::MessageStatusChanged {
            message_id: message.id.clone(),
            chat_id: message.chat_id.clone(),
            status: message.status,
        });
    }
    Ok(message)
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    #[instrument(skip(self, data), fields(chat_id = %data.chat_id, sender_id = %data.sender_id))]
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, AppError> {
        debug!("Creating new message");
        data.validate()?;

        self.messages.pause(Op::Create).await;

        let message = Message {
            id: self.messages.next_id(),
            chat_id: data.chat_id.clone(),
            sender_id: data.sender_id.clone(),
            content: data.content.clone(),
            message_type: data.message_type,
            timestamp: Utc::now(),
            status: MessageStatus::Sent,
            media_url: data.media_url.clone(),
        };
        let message = self.messages.insert(message).await;

        self.schedule_delivery(&message);
        self.events.publish(ChatEvent::MessageCreated(message.clone()));

        info!("Message created with id {}", message.id);
        Ok(message)
    }
}

impl Read<Message> for MessageRepository {
    #[instrument(skip(self), fields(message_id = %id))]
    async fn get_by_id(&self, id: &str) -> Result<Message, AppError> {
        self.messages.pause(Op::GetById).await;
        self.messages.find(id).await
    }
}

impl ReadAll<Message> for MessageRepository {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Message>, AppError> {
        self.messages.pause(Op::GetAll).await;
        let mut messages = self.messages.snapshot().await;
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }
}

impl Update<Message, UpdateMessageDTO> for MessageRepository {
    /// Operazione grezza: applica anche uno status precedente a quello attuale.
    /// I flussi del controller usano `update_status`, che è monotono.
    #[instrument(skip(self, data), fields(message_id = %id))]
    async fn update(&self, id: &str, data: &UpdateMessageDTO) -> Result<Message, AppError> {
        data.validate()?;

        let _turn = self.messages.sequence(id).await;
        self.messages.pause(Op::Update).await;

        let mut status_changed = false;
        let message = self
            .messages
            .modify(id, |m| {
                if let Some(content) = &data.content {
                    m.content = content.clone();
                }
                if let Some(media_url) = &data.media_url {
                    m.media_url = Some(media_url.clone());
                }
                if let Some(status) = data.status {
                    if status < m.status {
                        warn!("Raw update moves status back from {:?} to {:?}", m.status, status);
                    }
                    status_changed = status != m.status;
                    m.status = status;
                }
                Ok(())
            })
            .await?;

        if status_changed {
            self.events.publish(ChatEvent::MessageStatusChanged {
                message_id: message.id.clone(),
                chat_id: message.chat_id.clone(),
                status: message.status,
            });
        }
        Ok(message)
    }
}

impl Delete for MessageRepository {
    #[instrument(skip(self), fields(message_id = %id))]
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let _turn = self.messages.sequence(id).await;
        self.messages.pause(Op::Delete).await;
        self.messages.remove(id).await?;
        self.cancel_delivery(id);
        info!("Message deleted");
        Ok(())
    }
}
