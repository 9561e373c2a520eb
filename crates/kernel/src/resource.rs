//! Precondition-checked CRUD over a [`Store`].
//!
//! Both resource kinds go through [`Resources`], so the ordering of checks is
//! the same everywhere: an update whose payload id disagrees with the
//! addressed id is rejected before the store is consulted, which keeps a
//! mismatched request from learning whether the target exists.

use std::sync::Arc;

use thiserror::Error;

use crate::store::{Entity, EntityId, Store, StoreError};

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: EntityId },

    #[error("{kind} id in the request body does not match the addressed id")]
    PreconditionFailed { kind: &'static str },

    #[error("{kind} is missing required fields: {}", fields.join(", "))]
    Validation {
        kind: &'static str,
        fields: Vec<&'static str>,
    },

    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<StoreError> for ResourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { kind, fields } => Self::Validation { kind, fields },
            StoreError::Backend(e) => Self::Store(e),
        }
    }
}

/// Resource operations for one entity kind, backed by its store.
pub struct Resources<E: Entity> {
    store: Arc<dyn Store<E>>,
}

impl<E: Entity> Clone for Resources<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<E: Entity> Resources<E> {
    pub fn new(store: Arc<dyn Store<E>>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<E>, ResourceError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn get(&self, id: EntityId) -> Result<E, ResourceError> {
        self.store
            .find(id)
            .await?
            .ok_or(ResourceError::NotFound { kind: E::KIND, id })
    }

    pub async fn create(&self, body: E) -> Result<E, ResourceError> {
        let saved = self.store.save(body).await?;
        tracing::debug!(kind = E::KIND, id = ?saved.id(), "resource created");
        Ok(saved)
    }

    /// Replace the entity stored under `id` with `body`.
    pub async fn update(&self, id: EntityId, body: E) -> Result<E, ResourceError> {
        if body.id() != Some(id) {
            tracing::debug!(kind = E::KIND, id, body_id = ?body.id(), "update id mismatch");
            return Err(ResourceError::PreconditionFailed { kind: E::KIND });
        }

        self.get(id).await?;

        let saved = self.store.save(body).await?;
        tracing::debug!(kind = E::KIND, id, "resource updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: EntityId) -> Result<(), ResourceError> {
        self.get(id).await?;
        self.store.delete_by_id(id).await?;
        tracing::debug!(kind = E::KIND, id, "resource deleted");
        Ok(())
    }

    /// Load the entity, apply `change` to it and persist the whole entity.
    pub async fn modify<F>(&self, id: EntityId, change: F) -> Result<E, ResourceError>
    where
        F: FnOnce(&mut E) + Send,
    {
        let mut entity = self.get(id).await?;
        change(&mut entity);
        Ok(self.store.save(entity).await?)
    }
}
