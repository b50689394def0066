//! Seed - Dati iniziali delle tre collezioni
//!
//! Un processo parte sempre dagli stessi dati: le fixture incluse nel binario oppure
//! i file `users.json`, `chats.json`, `messages.json` di una directory esterna.

use crate::core::{AppError, Config};
use crate::entities::{Chat, Message, User, check_participants};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

const USERS_JSON: &str = include_str!("../fixtures/users.json");
const CHATS_JSON: &str = include_str!("../fixtures/chats.json");
const MESSAGES_JSON: &str = include_str!("../fixtures/messages.json");

#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub users: Vec<User>,
    pub chats: Vec<Chat>,
    pub messages: Vec<Message>,
}

impl Seed {
    /// Fixture incluse nel binario
    pub fn bundled() -> Result<Self, AppError> {
        Self::parse(USERS_JSON, CHATS_JSON, MESSAGES_JSON)
    }

    /// Legge le fixture da `dir`
    #[instrument]
    pub fn from_dir(dir: &Path) -> Result<Self, AppError> {
        let users = fs::read_to_string(dir.join("users.json"))?;
        let chats = fs::read_to_string(dir.join("chats.json"))?;
        let messages = fs::read_to_string(dir.join("messages.json"))?;
        Self::parse(&users, &chats, &messages)
    }

    /// Sceglie la sorgente in base a `SEED_DIR`
    pub fn load(config: &Config) -> Result<Self, AppError> {
        let seed = match &config.seed_dir {
            Some(dir) => Self::from_dir(dir)?,
            None => Self::bundled()?,
        };
        info!(
            "Seed loaded: {} users, {} chats, {} messages",
            seed.users.len(),
            seed.chats.len(),
            seed.messages.len()
        );
        Ok(seed)
    }

    pub fn parse(users: &str, chats: &str, messages: &str) -> Result<Self, AppError> {
        let seed = Self {
            users: parse_array(users)?,
            chats: parse_array(chats)?,
            messages: parse_array(messages)?,
        };
        seed.check()?;
        Ok(seed)
    }

    /// Controlla gli invarianti che gli store danno per scontati
    fn check(&self) -> Result<(), AppError> {
        unique(self.users.iter().map(|u| u.id.as_str()), "Duplicate user id in seed")?;
        unique(
            self.users.iter().map(|u| u.phone_number.as_str()),
            "Duplicate phone number in seed",
        )?;
        unique(self.chats.iter().map(|c| c.id.as_str()), "Duplicate chat id in seed")?;
        unique(
            self.messages.iter().map(|m| m.id.as_str()),
            "Duplicate message id in seed",
        )?;

        for chat in &self.chats {
            check_participants(chat.chat_type(), &chat.participants).map_err(|reason| {
                AppError::internal("Invalid chat participants in seed")
                    .with_details(format!("chat {}: {reason}", chat.id))
            })?;
        }

        let chat_ids: HashSet<&str> = self.chats.iter().map(|c| c.id.as_str()).collect();
        for message in &self.messages {
            if !chat_ids.contains(message.chat_id.as_str()) {
                // non blocca l'avvio: il messaggio resta raggiungibile solo per id
                warn!("Seed message {} references unknown chat {}", message.id, message.chat_id);
            }
        }
        Ok(())
    }
}

fn parse_array<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, AppError> {
    Ok(serde_json::from_str(raw)?)
}

fn unique<'a>(
    mut values: impl Iterator<Item = &'a str>,
    message: &'static str,
) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    match values.find(|v| !seen.insert(*v)) {
        Some(dup) => Err(AppError::internal(message).with_details(dup.to_string())),
        None => Ok(()),
    }
}
