//! Common repository traits
//!
//! Entity ids are timestamp-based strings.
//! This module defines the generic CRUD contract shared by the chat, message and user
//! stores. Every implementation waits its simulated latency before touching the data.

use crate::core::AppError;

/// Trait for creating new entities
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with generated ID and defaults applied)
/// * `CreateDTO` - DTO for creation (without ID, will be automatically generated)
pub trait Create<Entity, CreateDTO> {
    /// Creates a new entity and appends it to the store
    ///
    /// # Returns
    /// * `Ok(Entity)` - Copy of the created entity
    /// * `Err(AppError)` - Validation error on malformed input
    async fn create(&self, data: &CreateDTO) -> Result<Entity, AppError>;
}

/// Trait for reading a single entity by ID
pub trait Read<Entity> {
    /// # Returns
    /// * `Ok(Entity)` - Copy of the entity
    /// * `Err(AppError)` - `NotFound` when no entity has that ID
    async fn get_by_id(&self, id: &str) -> Result<Entity, AppError>;
}

/// Trait for reading the whole collection in the store's natural order
pub trait ReadAll<Entity> {
    /// Returns a copy of every entity. Never mutates the store.
    async fn get_all(&self) -> Result<Vec<Entity>, AppError>;
}

/// Trait for updating existing entities
///
/// # Type Parameters
/// * `Entity` - Type of the updated entity
/// * `UpdateDTO` - DTO for updating (optional fields for partial updates)
pub trait Update<Entity, UpdateDTO> {
    /// Shallow-merges the `Some(_)` fields of `data` onto the stored entity
    ///
    /// # Returns
    /// * `Ok(Entity)` - Updated entity
    /// * `Err(AppError)` - `NotFound` when the entity does not exist
    async fn update(&self, id: &str, data: &UpdateDTO) -> Result<Entity, AppError>;
}

/// Trait for deleting entities
pub trait Delete {
    /// # Returns
    /// * `Ok(())` - Deletion successful
    /// * `Err(AppError)` - `NotFound` when the entity does not exist; the store is unchanged
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}
