use std::sync::Arc;

use async_trait::async_trait;
use shelf_db::{JoinTable, MemoryStore};
use shelf_kernel::{EntityId, Store, StoreError};

use super::models::Book;

/// Book storage. Removing a book also drops every holding that references it.
pub struct BookStore {
    rows: MemoryStore<Book>,
    holdings: Arc<JoinTable>,
}

impl BookStore {
    pub fn new(sequence_start: EntityId, holdings: Arc<JoinTable>) -> Self {
        Self {
            rows: MemoryStore::with_sequence_start(sequence_start),
            holdings,
        }
    }

    /// Ids of the users currently holding `id`.
    pub async fn holders(&self, id: EntityId) -> Vec<EntityId> {
        self.holdings.lefts_of(id).await
    }
}

#[async_trait]
impl Store<Book> for BookStore {
    async fn find(&self, id: EntityId) -> Result<Option<Book>, StoreError> {
        self.rows.find(id).await
    }

    async fn save(&self, book: Book) -> Result<Book, StoreError> {
        self.rows.save(book).await
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), StoreError> {
        self.rows.delete_by_id(id).await?;
        self.holdings.remove_right(id).await;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        self.rows.find_all().await
    }
}
