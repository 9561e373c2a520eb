use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use shelf_db::{JoinTable, MemoryStore};
use shelf_kernel::{Entity, EntityId, Store, StoreError};

use super::models::User;
use crate::modules::books::models::Book;

/// User storage.
///
/// User rows are kept without their collection; holdings live in the shared
/// join table as (user id, book id) pairs and are hydrated from the book store
/// on every read.
pub struct UserStore {
    rows: MemoryStore<User>,
    books: Arc<dyn Store<Book>>,
    holdings: Arc<JoinTable>,
}

impl UserStore {
    pub fn new(
        sequence_start: EntityId,
        books: Arc<dyn Store<Book>>,
        holdings: Arc<JoinTable>,
    ) -> Self {
        Self {
            rows: MemoryStore::with_sequence_start(sequence_start),
            books,
            holdings,
        }
    }

    async fn hydrate(&self, mut user: User) -> Result<User, StoreError> {
        let Some(id) = user.id else {
            return Ok(user);
        };

        let mut books = Vec::new();
        for book_id in self.holdings.rights_of(id).await {
            if let Some(book) = self.books.find(book_id).await? {
                books.push(book);
            }
        }
        user.books = books;
        Ok(user)
    }

    /// Resolve every held book to a stored id.
    ///
    /// A book without an id resolves to the first stored book with equal content.
    async fn held_ids(&self, user: &User) -> Result<Vec<EntityId>, StoreError> {
        let mut ids = Vec::with_capacity(user.books.len());
        for book in &user.books {
            let stored = match book.id {
                Some(id) => self.books.find(id).await?.map(|_| id),
                None => self
                    .books
                    .find_all()
                    .await?
                    .into_iter()
                    .find(|candidate| candidate == book)
                    .and_then(|candidate| candidate.id),
            };
            let Some(id) = stored else {
                tracing::debug!(book_id = ?book.id, "held book is not stored");
                return Err(StoreError::Validation {
                    kind: User::KIND,
                    fields: vec!["books"],
                });
            };
            ids.push(id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl Store<User> for UserStore {
    async fn find(&self, id: EntityId) -> Result<Option<User>, StoreError> {
        match self.rows.find(id).await? {
            Some(user) => Ok(Some(self.hydrate(user).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, mut user: User) -> Result<User, StoreError> {
        StoreError::check(&user)?;
        let book_ids = self.held_ids(&user).await?;

        user.books.clear();
        let saved = self.rows.save(user).await?;
        let id = saved
            .id
            .ok_or_else(|| StoreError::Backend(anyhow!("user saved without an id")))?;

        self.holdings.replace(id, book_ids).await;
        self.hydrate(saved).await
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), StoreError> {
        self.rows.delete_by_id(id).await?;
        self.holdings.remove_left(id).await;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::new();
        for user in self.rows.find_all().await? {
            users.push(self.hydrate(user).await?);
        }
        Ok(users)
    }
}
