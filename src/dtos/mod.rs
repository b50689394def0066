//! DTOs module - Data Transfer Objects
//!
//! Input delle operazioni di create/update degli store. Separano i dati forniti dal
//! chiamante (senza id, timestamp, default) dalle entità salvate.

pub mod chat;
pub mod message;
pub mod user;

pub use chat::{CreateChatDTO, UpdateChatDTO};
pub use message::{CreateMessageDTO, MediaFile, UpdateMessageDTO};
pub use user::{CreateUserDTO, UpdateUserDTO};
