//! ConversationController - Flussi che coinvolgono più store
//!
//! Gli store non si conoscono tra loro: è il controller a tenere allineato lo snapshot
//! `Chat.last_message` con i messaggi creati, a propagare le conferme di lettura e a
//! simulare l'interlocutore (risposte e indicatore di scrittura). Gli errori degli store
//! vengono propagati senza retry.

use crate::core::{AppError, AppState};
use crate::dtos::{CreateChatDTO, CreateMessageDTO, MediaFile};
use crate::entities::{Chat, LastMessage, Message, User};
use crate::events::ChatEvent;
use crate::repositories::{Create, Read, ReadAll};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

/// Risposte automatiche dell'interlocutore simulato
pub const CANNED_REPLIES: [&str; 5] = [
    "Thanks for the message!",
    "I'll get back to you soon.",
    "Sounds good! 👍",
    "Let me think about it.",
    "Great idea!",
];

/// Tutto ciò che serve per mostrare una conversazione aperta
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub chat: Chat,
    pub messages: Vec<Message>,
    pub participants: Vec<User>,
}

/// Esito di `mark_chat_read`
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub chat: Chat,
    /// Messaggi passati a `read` da questa chiamata
    pub messages_read: usize,
}

pub struct ConversationController {
    state: Arc<AppState>,
    // mai tenuto attraverso un await
    rng: Mutex<StdRng>,
}

impl ConversationController {
    pub fn new(state: Arc<AppState>) -> Self {
        let rng = match state.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state,
            rng: Mutex::new(rng),
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    fn roll<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Invia un messaggio di testo e aggiorna lo snapshot della chat.
    ///
    /// Il messaggio viene creato prima dell'aggiornamento della chat: se quest'ultimo
    /// fallisce il messaggio resta salvato e l'errore viene restituito al chiamante.
    #[instrument(skip(self, content))]
    pub async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Message, AppError> {
        let message = self
            .state
            .msg
            .create(&CreateMessageDTO::text(chat_id, sender_id, content))
            .await?;
        self.sync_last_message(&message).await?;
        info!("Message {} sent", message.id);
        Ok(message)
    }

    /// Invia un file. Il tipo deriva dal MIME type, il contenuto è il nome del file e
    /// lo snapshot della chat mostra un'anteprima ("Photo", "File", "Voice message").
    #[instrument(skip(self, file), fields(file = %file.name))]
    pub async fn send_media(
        &self,
        chat_id: &str,
        sender_id: &str,
        file: &MediaFile,
    ) -> Result<Message, AppError> {
        let dto = CreateMessageDTO {
            message_type: file.message_type(),
            media_url: Some(file.url.clone()),
            ..CreateMessageDTO::text(chat_id, sender_id, file.name.clone())
        };
        let message = self.state.msg.create(&dto).await?;
        self.sync_last_message(&message).await?;
        info!("Media message {} sent as {:?}", message.id, message.message_type);
        Ok(message)
    }

    /// Marca come letti i messaggi ricevuti da `reader_id`, poi azzera i non letti.
    /// Chiamarla due volte di seguito lascia lo stesso stato di una sola chiamata.
    #[instrument(skip(self))]
    pub async fn mark_chat_read(
        &self,
        chat_id: &str,
        reader_id: &str,
    ) -> Result<ReadReceipt, AppError> {
        let changed = self.state.msg.mark_messages_as_read(chat_id, reader_id).await?;
        let chat = self.state.chat.mark_as_read(chat_id, reader_id).await?;
        self.state.events.publish(ChatEvent::ChatUpdated(chat.clone()));
        Ok(ReadReceipt {
            chat,
            messages_read: changed.len(),
        })
    }

    /// Con probabilità `reply_probability`, programma una risposta dell'interlocutore
    /// dopo un ritardo casuale. Solo per le chat individuali.
    ///
    /// La risposta arriva con la chat aperta: lo snapshot viene aggiornato e i non letti
    /// restano a zero.
    pub fn simulate_incoming_reply(
        &self,
        chat: &Chat,
    ) -> Option<JoinHandle<Result<Message, AppError>>> {
        if !chat.is_individual() {
            return None;
        }
        let counterpart = chat.counterpart_of(self.state.user.current_user_id())?.to_string();
        let config = &self.state.config;

        let (delay, reply) = self.roll(|rng| {
            if !rng.gen_bool(chance(config.reply_probability)) {
                return None;
            }
            let (min, max) = ordered(config.reply_delay_min, config.reply_delay_max);
            let delay = Duration::from_millis(rng.gen_range(min..=max));
            let reply = CANNED_REPLIES.choose(rng).copied().unwrap_or(CANNED_REPLIES[0]);
            Some((delay, reply))
        })?;

        debug!("Reply from {} scheduled in {}ms", counterpart, delay.as_millis());
        let state = Arc::clone(&self.state);
        let chat_id = chat.id.clone();
        let span = info_span!("simulated_reply", chat_id = %chat_id);

        Some(tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                let message = state
                    .msg
                    .create(&CreateMessageDTO::text(&chat_id, &counterpart, reply))
                    .await?;
                let updated = state
                    .chat
                    .refresh_last_message(&chat_id, LastMessage::from(&message), Some(0))
                    .await
                    .inspect_err(|e| warn!("Reply {} stored but chat not updated: {}", message.id, e))?;
                state.events.publish(ChatEvent::ChatUpdated(updated));
                Ok::<_, AppError>(message)
            }
            .instrument(span),
        ))
    }

    /// Con probabilità `typing_probability` mostra l'interlocutore mentre scrive per
    /// `typing_duration`. Solo per le chat individuali.
    pub fn simulate_typing(&self, chat: &Chat) -> Option<JoinHandle<()>> {
        if !chat.is_individual() {
            return None;
        }
        let user_id = chat.counterpart_of(self.state.user.current_user_id())?.to_string();
        let probability = self.state.config.typing_probability;
        if !self.roll(|rng| rng.gen_bool(chance(probability))) {
            return None;
        }

        let events = self.state.events.clone();
        let duration = self.state.config.typing_duration;
        let chat_id = chat.id.clone();
        events.publish(ChatEvent::Typing {
            chat_id: chat_id.clone(),
            user_id: user_id.clone(),
            active: true,
        });

        Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            events.publish(ChatEvent::Typing {
                chat_id,
                user_id,
                active: false,
            });
        }))
    }

    /// Carica chat, messaggi e partecipanti in parallelo
    #[instrument(skip(self))]
    pub async fn open_chat(&self, chat_id: &str) -> Result<ChatView, AppError> {
        let (chat, messages, users) = tokio::try_join!(
            self.state.chat.get_by_id(chat_id),
            self.state.msg.get_by_chat_id(chat_id),
            self.state.user.get_all(),
        )?;
        let participants = users
            .into_iter()
            .filter(|u| chat.has_participant(&u.id))
            .collect();
        Ok(ChatView {
            chat,
            messages,
            participants,
        })
    }

    /// Restituisce la chat individuale già esistente con `contact_id`, altrimenti la crea
    #[instrument(skip(self))]
    pub async fn start_individual_chat(
        &self,
        current_user_id: &str,
        contact_id: &str,
    ) -> Result<Chat, AppError> {
        // il contatto deve esistere
        self.state.user.get_by_id(contact_id).await?;

        if let Some(chat) = self
            .state
            .chat
            .find_individual_between(current_user_id, contact_id)
            .await?
        {
            debug!("Reusing chat {}", chat.id);
            return Ok(chat);
        }

        let chat = self
            .state
            .chat
            .create(&CreateChatDTO::individual(current_user_id, contact_id))
            .await?;
        self.state.events.publish(ChatEvent::ChatUpdated(chat.clone()));
        Ok(chat)
    }

    /// Filtra la lista chat: i gruppi per nome, le chat individuali per il nome
    /// dell'altro partecipante. Una query vuota restituisce tutte le chat.
    #[instrument(skip(self))]
    pub async fn search_chats(
        &self,
        current_user_id: &str,
        query: &str,
    ) -> Result<Vec<Chat>, AppError> {
        let (chats, users) =
            tokio::try_join!(self.state.chat.get_all(), self.state.user.get_all())?;

        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(chats);
        }

        let title = |chat: &Chat| -> Option<String> {
            match chat.group_name() {
                Some(name) => Some(name.to_string()),
                None => {
                    let other = chat.counterpart_of(current_user_id)?;
                    users
                        .iter()
                        .find(|u| u.id == other)
                        .map(|u| u.display_name.clone())
                }
            }
        };

        Ok(chats
            .into_iter()
            .filter(|chat| title(chat).is_some_and(|t| t.to_lowercase().contains(&needle)))
            .collect())
    }

    /// Aggiorna `last_seen` dell'utente
    #[instrument(skip(self))]
    pub async fn touch_presence(&self, user_id: &str) -> Result<User, AppError> {
        self.state.user.update_last_seen(user_id).await
    }

    async fn sync_last_message(&self, message: &Message) -> Result<Chat, AppError> {
        let chat = self
            .state
            .chat
            .refresh_last_message(&message.chat_id, LastMessage::from(message), None)
            .await
            .inspect_err(|e| {
                warn!("Message {} stored but chat not updated: {}", message.id, e);
            })?;
        self.state.events.publish(ChatEvent::ChatUpdated(chat.clone()));
        Ok(chat)
    }
}

/// `gen_bool` accetta solo valori in [0, 1]; NaN vale zero
fn chance(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

/// Estremi del ritardo in millisecondi, anche se configurati al contrario
fn ordered(a: Duration, b: Duration) -> (u64, u64) {
    let (a, b) = (a.as_millis() as u64, b.as_millis() as u64);
    (a.min(b), a.max(b))
}
