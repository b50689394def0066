//! Repositories module - Coordinatore per tutti gli store in memoria
//!
//! Ogni repository possiede la collezione della propria entità e simula la latenza di
//! un backend remoto. Nessuno store condivide stato con gli altri: le relazioni
//! (es. `Chat.last_message`) vanno mantenute esplicitamente dal controller.

// ************************* MODULI REPOSITORY ************************* //

pub mod chat;
pub mod collection;
pub mod message;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadAll, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use chat::ChatRepository;
pub use message::{DeliveryHandle, MessageRepository};
pub use user::UserRepository;
