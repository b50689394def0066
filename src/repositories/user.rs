//! UserRepository - Repository per la gestione degli utenti

use super::collection::{Collection, Entity};
use super::{Create, Delete, Read, ReadAll, Update};
use crate::core::AppError;
use crate::core::latency::{Latency, Op};
use crate::dtos::{CreateUserDTO, UpdateUserDTO};
use crate::entities::User;
use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const DEFAULT_STATUS: &str = "Available";

impl Entity for User {
    const NOT_FOUND: &'static str = "User not found";

    fn id(&self) -> &str {
        &self.id
    }
}

// USER REPO
pub struct UserRepository {
    users: Collection<User>,
    // l'utente "loggato": non c'è autenticazione, viene dalla configurazione
    current_user_id: String,
    online_window: Duration,
}

impl UserRepository {
    pub fn new(
        seed: Vec<User>,
        latency: Latency,
        current_user_id: impl Into<String>,
        online_window: Duration,
    ) -> Self {
        Self {
            users: Collection::new(seed, latency),
            current_user_id: current_user_id.into(),
            online_window,
        }
    }

    pub fn current_user_id(&self) -> &str {
        &self.current_user_id
    }

    /// L'utente corrente, sempre letto dalla collezione: riflette gli update più recenti
    #[instrument(skip(self))]
    pub async fn get_current_user(&self) -> Result<User, AppError> {
        self.users.pause(Op::GetCurrentUser).await;
        self.users.find(&self.current_user_id).await
    }

    /// Search users by display name (case insensitive) or phone number fragment.
    /// A blank query returns every user.
    #[instrument(skip(self))]
    pub async fn search_by_name(&self, query: &str) -> Result<Vec<User>, AppError> {
        self.users.pause(Op::Search).await;
        let users = self.users.filter(|u| u.matches(query)).await;
        debug!("Found {} users matching search criteria", users.len());
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn update_last_seen(&self, id: &str) -> Result<User, AppError> {
        let _turn = self.users.sequence(id).await;
        self.users.pause(Op::UpdateLastSeen).await;
        self.users
            .modify(id, |user| {
                user.last_seen = Utc::now();
                Ok(())
            })
            .await
    }

    /// Presenza derivata: non fa I/O simulato
    pub fn is_online(&self, user: &User) -> bool {
        user.is_online_at(Utc::now(), self.online_window)
    }
}

/// Avatar generato dalle iniziali quando l'utente non ne fornisce uno
fn default_avatar(display_name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=128C7E&color=fff",
        encode_component(display_name)
    )
}

/// Stessi caratteri non codificati di encodeURIComponent
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

impl Create<User, CreateUserDTO> for UserRepository {
    #[instrument(skip(self, data), fields(display_name = %data.display_name))]
    async fn create(&self, data: &CreateUserDTO) -> Result<User, AppError> {
        debug!("Creating new user");
        data.validate()?;

        self.users.pause(Op::Create).await;

        let user = User {
            id: self.users.next_id(),
            display_name: data.display_name.clone(),
            phone_number: data.phone_number.clone(),
            avatar: Some(
                data.avatar
                    .clone()
                    .unwrap_or_else(|| default_avatar(&data.display_name)),
            ),
            status: data
                .status
                .clone()
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            last_seen: Utc::now(),
        };

        let user = self
            .users
            .insert_unique(user, |existing, new| existing.phone_number == new.phone_number)
            .await
            .ok_or_else(|| {
                warn!("Phone number already registered");
                AppError::conflict("Phone number already registered")
            })?;

        info!("User created with id {}", user.id);
        Ok(user)
    }
}

impl Read<User> for UserRepository {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_by_id(&self, id: &str) -> Result<User, AppError> {
        self.users.pause(Op::GetById).await;
        self.users.find(id).await
    }
}

impl ReadAll<User> for UserRepository {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<User>, AppError> {
        self.users.pause(Op::GetAll).await;
        Ok(self.users.snapshot().await)
    }
}

impl Update<User, UpdateUserDTO> for UserRepository {
    #[instrument(skip(self, data), fields(user_id = %id))]
    async fn update(&self, id: &str, data: &UpdateUserDTO) -> Result<User, AppError> {
        data.validate()?;

        let _turn = self.users.sequence(id).await;
        self.users.pause(Op::Update).await;

        if let Some(phone) = &data.phone_number {
            let taken = self
                .users
                .any(|u| u.id != id && &u.phone_number == phone)
                .await;
            if taken {
                warn!("Phone number already registered");
                return Err(AppError::conflict("Phone number already registered"));
            }
        }

        self.users
            .modify(id, |user| {
                if let Some(display_name) = &data.display_name {
                    user.display_name = display_name.clone();
                }
                if let Some(phone_number) = &data.phone_number {
                    user.phone_number = phone_number.clone();
                }
                if let Some(avatar) = &data.avatar {
                    user.avatar = Some(avatar.clone());
                }
                if let Some(status) = &data.status {
                    user.status = status.clone();
                }
                if let Some(last_seen) = data.last_seen {
                    user.last_seen = last_seen;
                }
                Ok(())
            })
            .await
    }
}

impl Delete for UserRepository {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let _turn = self.users.sequence(id).await;
        self.users.pause(Op::Delete).await;
        self.users.remove(id).await?;
        info!("User deleted");
        Ok(())
    }
}
