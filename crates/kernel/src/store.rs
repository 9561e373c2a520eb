//! Entity and storage contracts shared by every resource kind.

use async_trait::async_trait;
use thiserror::Error;

/// Numeric identifier assigned by a store.
pub type EntityId = i64;

/// A record that can be kept in a [`Store`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human readable kind used in errors and logs, e.g. `"Book"`.
    const KIND: &'static str;

    /// Identifier carried by the record, `None` before the first save.
    fn id(&self) -> Option<EntityId>;

    /// Stamp the store-assigned identifier.
    fn set_id(&mut self, id: EntityId);

    /// Names of required attributes that are absent.
    fn missing_fields(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} is missing required fields: {}", fields.join(", "))]
    Validation {
        kind: &'static str,
        fields: Vec<&'static str>,
    },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Reject an entity whose required attributes are absent.
    pub fn check<E: Entity>(entity: &E) -> Result<(), StoreError> {
        let fields = entity.missing_fields();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation {
                kind: E::KIND,
                fields,
            })
        }
    }
}

/// Durable keyed storage for one entity kind.
///
/// `save` is insert-or-replace: an entity without an id receives a fresh one,
/// an entity with an id replaces whatever is stored under it.
#[async_trait]
pub trait Store<E: Entity>: Send + Sync {
    async fn find(&self, id: EntityId) -> Result<Option<E>, StoreError>;

    async fn save(&self, entity: E) -> Result<E, StoreError>;

    async fn delete_by_id(&self, id: EntityId) -> Result<(), StoreError>;

    async fn find_all(&self) -> Result<Vec<E>, StoreError>;
}
