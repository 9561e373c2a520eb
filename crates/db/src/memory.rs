//! Keyed in-memory implementation of [`Store`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use shelf_kernel::{Entity, EntityId, Store, StoreError};
use tokio::sync::RwLock;

/// Thread-safe in-memory store for one entity kind.
///
/// Rows are kept ordered by id so `find_all` is deterministic. Ids come from a
/// sequence; saving an entity that already carries an id stores it under that
/// id and moves the sequence past it.
pub struct MemoryStore<E: Entity> {
    rows: RwLock<BTreeMap<EntityId, E>>,
    sequence: AtomicI64,
}

impl<E: Entity> MemoryStore<E> {
    /// Create an empty store whose first assigned id is `1`.
    pub fn new() -> Self {
        Self::with_sequence_start(1)
    }

    /// Create an empty store whose first assigned id is `start`.
    pub fn with_sequence_start(start: EntityId) -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicI64::new(start),
        }
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Whether a row exists under `id`.
    pub async fn contains(&self, id: EntityId) -> bool {
        self.rows.read().await.contains_key(&id)
    }
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> Store<E> for MemoryStore<E> {
    async fn find(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, mut entity: E) -> Result<E, StoreError> {
        StoreError::check(&entity)?;

        let id = match entity.id() {
            Some(id) => {
                if let Some(next) = id.checked_add(1) {
                    self.sequence.fetch_max(next, Ordering::SeqCst);
                }
                id
            }
            None => {
                let id = self.sequence.fetch_add(1, Ordering::SeqCst);
                entity.set_id(id);
                id
            }
        };

        self.rows.write().await.insert(id, entity.clone());
        tracing::trace!(kind = E::KIND, id, "row saved");
        Ok(entity)
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), StoreError> {
        self.rows.write().await.remove(&id);
        tracing::trace!(kind = E::KIND, id, "row deleted");
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<E>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}
