#![allow(dead_code)]

use chatcore::core::Config;
use chatcore::entities::{Chat, ChatKind, LastMessage, Message, MessageStatus, MessageType, User};
use chatcore::{AppState, ConversationController, Seed};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Configurazione senza latenze, senza consegna automatica e senza simulazioni casuali
pub fn test_config() -> Config {
    Config {
        delivery_delay: None,
        ..Config::for_tests()
    }
}

/// Crea un AppState per i test a partire da `config` e `seed`
pub fn create_test_state(config: Config, seed: Seed) -> Arc<AppState> {
    Arc::new(AppState::new(config, seed))
}

/// Controller su un AppState senza latenze costruito da `test_seed()`
pub fn create_test_controller() -> ConversationController {
    ConversationController::new(create_test_state(test_config(), test_seed()))
}

/// Come `create_test_controller`, con la consegna automatica dopo `delay`
pub fn create_controller_with_delivery(delay: Duration) -> ConversationController {
    let config = Config {
        delivery_delay: Some(delay),
        ..test_config()
    };
    ConversationController::new(create_test_state(config, test_seed()))
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - TimeDelta::minutes(minutes)
}

pub fn user(id: &str, name: &str, phone: &str) -> User {
    User {
        id: id.to_string(),
        display_name: name.to_string(),
        phone_number: phone.to_string(),
        avatar: None,
        status: "Available".to_string(),
        last_seen: minutes_ago(60),
    }
}

pub fn text(id: &str, chat_id: &str, sender: &str, status: MessageStatus, minutes: i64) -> Message {
    Message {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender_id: sender.to_string(),
        content: format!("message {id}"),
        message_type: MessageType::Text,
        timestamp: minutes_ago(minutes),
        status,
        media_url: None,
    }
}

/// Utenti "1" (corrente), "2", "3", "4".
/// Chat "c1" individuale tra 1 e 2 con 3 non letti, "c2" individuale tra 1 e 3 senza
/// messaggi, "g1" gruppo "Book Club" tra 1, 2 e 4.
pub fn test_seed() -> Seed {
    let users = vec![
        user("1", "You", "+1 555 0001"),
        user("2", "Sarah Johnson", "+1 555 0002"),
        user("3", "Mike Chen", "+1 555 0003"),
        user("4", "Emma Wilson", "+1 555 0004"),
    ];

    let messages = vec![
        text("m1", "c1", "2", MessageStatus::Delivered, 30),
        text("m2", "c1", "1", MessageStatus::Delivered, 20),
        text("m3", "c1", "2", MessageStatus::Delivered, 10),
        text("m4", "c1", "2", MessageStatus::Sent, 5),
        text("m5", "g1", "4", MessageStatus::Delivered, 15),
    ];

    let snapshot = |m: &Message| LastMessage::from(m);

    let chats = vec![
        Chat {
            id: "c1".to_string(),
            kind: ChatKind::Individual,
            participants: vec!["1".to_string(), "2".to_string()],
            last_message: Some(snapshot(&messages[3])),
            unread_count: 3,
            created_at: minutes_ago(600),
        },
        Chat {
            id: "c2".to_string(),
            kind: ChatKind::Individual,
            participants: vec!["1".to_string(), "3".to_string()],
            last_message: None,
            unread_count: 0,
            created_at: minutes_ago(500),
        },
        Chat {
            id: "g1".to_string(),
            kind: ChatKind::Group {
                group_name: "Book Club".to_string(),
                group_avatar: None,
            },
            participants: vec!["1".to_string(), "2".to_string(), "4".to_string()],
            last_message: Some(snapshot(&messages[4])),
            unread_count: 1,
            created_at: minutes_ago(400),
        },
    ];

    Seed {
        users,
        chats,
        messages,
    }
}
