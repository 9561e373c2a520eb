use serde::{Deserialize, Serialize};
use shelf_kernel::{settings::MatchRule, Entity, EntityId};

use crate::modules::books::models::Book;

/// An account and the books it holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub username: Option<String>,
    pub name: Option<String>,
    /// ISO-8601 date, optional
    pub birthdate: Option<String>,
    /// Owned collection; each book appears at most once under the match rule.
    #[serde(default)]
    pub books: Vec<Book>,
}

impl User {
    /// Whether the collection already holds `book` under `rule`.
    pub fn holds(&self, book: &Book, rule: MatchRule) -> bool {
        self.books.iter().any(|held| held.same_as(book, rule))
    }

    /// Add `book` unless an equal one is already held.
    ///
    /// Only in-memory state changes; the caller persists the user.
    pub fn add_book(&mut self, book: Book, rule: MatchRule) {
        if !self.holds(&book, rule) {
            self.books.push(book);
        }
    }

    /// Remove `book` if held; removing an absent book is a no-op.
    pub fn remove_book(&mut self, book: &Book, rule: MatchRule) {
        self.books.retain(|held| !held.same_as(book, rule));
    }
}

impl Entity for User {
    const KIND: &'static str = "User";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.username.is_none() {
            missing.push("username");
        }
        if self.name.is_none() {
            missing.push("name");
        }
        missing
    }
}

#[cfg(test)]
pub(crate) fn reader() -> User {
    User {
        id: None,
        username: Some("pauline".to_string()),
        name: Some("Pauline Reader".to_string()),
        birthdate: Some("1990-04-01".to_string()),
        books: Vec::new(),
    }
}
