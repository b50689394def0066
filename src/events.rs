//! Events - Notifiche verso il livello di presentazione
//!
//! Gli store e il controller pubblicano qui i cambiamenti che avvengono fuori dal
//! flusso richiesta/risposta (consegna automatica, risposte simulate, typing), così
//! la UI può ridisegnarsi senza fare polling.

use crate::entities::{Chat, Message, MessageStatus};
use serde::Serialize;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, instrument};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageCreated(Message),
    MessageStatusChanged {
        message_id: String,
        chat_id: String,
        status: MessageStatus,
    },
    ChatUpdated(Chat),
    Typing {
        chat_id: String,
        user_id: String,
        active: bool,
    },
}

/// Hub broadcast condiviso: clonarlo condivide lo stesso canale
#[derive(Clone)]
pub struct EventHub {
    tx: Sender<ChatEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    /// Stream degli eventi, per chi preferisce `StreamExt`
    pub fn stream(&self) -> BroadcastStream<ChatEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }

    /// Pubblica un evento. Senza ricevitori l'evento viene scartato.
    #[instrument(skip(self, event))]
    pub fn publish(&self, event: ChatEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No subscribers, event dropped");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let hub = EventHub::new(8);
        let mut first = hub.subscribe();
        let mut second = hub.clone().subscribe();

        let event = ChatEvent::Typing {
            chat_id: "c1".into(),
            user_id: "2".into(),
            active: true,
        };
        assert_eq!(hub.publish(event.clone()), 2);
        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let hub = EventHub::new(8);
        let sent = hub.publish(ChatEvent::MessageStatusChanged {
            message_id: "m1".into(),
            chat_id: "c1".into(),
            status: MessageStatus::Delivered,
        });
        assert_eq!(sent, 0);
    }
}
