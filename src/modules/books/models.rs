use serde::{Deserialize, Serialize};
use shelf_kernel::{settings::MatchRule, Entity, EntityId};

/// A bibliographic record.
///
/// Every attribute except `genre` is required; absence is reported by the
/// store when the book is saved. Equality ignores `id` so a request body can
/// be compared with stored books before it has been persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: Option<EntityId>,
    pub genre: Option<String>,
    pub author: Option<String>,
    /// Cover image location
    pub image: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub publisher: Option<String>,
    /// Publication year as printed
    pub year: Option<String>,
    pub pages: Option<i32>,
    pub isbn: Option<String>,
}

impl Book {
    /// Whether `self` and `other` denote the same book under `rule`.
    pub fn same_as(&self, other: &Book, rule: MatchRule) -> bool {
        match rule {
            MatchRule::Content => self == other,
            MatchRule::Id => self.id.is_some() && self.id == other.id,
        }
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.genre == other.genre
            && self.author == other.author
            && self.image == other.image
            && self.title == other.title
            && self.subtitle == other.subtitle
            && self.publisher == other.publisher
            && self.year == other.year
            && self.pages == other.pages
            && self.isbn == other.isbn
    }
}

impl Eq for Book {}

impl Entity for Book {
    const KIND: &'static str = "Book";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let required = [
            ("author", self.author.is_none()),
            ("image", self.image.is_none()),
            ("title", self.title.is_none()),
            ("subtitle", self.subtitle.is_none()),
            ("publisher", self.publisher.is_none()),
            ("year", self.year.is_none()),
            ("pages", self.pages.is_none()),
            ("isbn", self.isbn.is_none()),
        ];
        required
            .into_iter()
            .filter_map(|(field, missing)| missing.then_some(field))
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn dune() -> Book {
    Book {
        id: None,
        genre: Some("Science Fiction".to_string()),
        author: Some("Herbert".to_string()),
        image: Some("dune.png".to_string()),
        title: Some("Dune".to_string()),
        subtitle: Some("Book One".to_string()),
        publisher: Some("Chilton".to_string()),
        year: Some("1965".to_string()),
        pages: Some(412),
        isbn: Some("X".to_string()),
    }
}
