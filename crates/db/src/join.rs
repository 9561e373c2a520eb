//! Attribute-less relationship rows keyed by (left id, right id).

use std::collections::BTreeSet;

use shelf_kernel::EntityId;
use tokio::sync::RwLock;

/// A many-to-many join table.
///
/// The owning side writes through [`JoinTable::replace`]; the other side only
/// reads through [`JoinTable::lefts_of`].
#[derive(Default)]
pub struct JoinTable {
    pairs: RwLock<BTreeSet<(EntityId, EntityId)>>,
}

impl JoinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `rights` the complete set of rows for `left`.
    pub async fn replace(&self, left: EntityId, rights: impl IntoIterator<Item = EntityId>) {
        let mut pairs = self.pairs.write().await;
        pairs.retain(|(l, _)| *l != left);
        pairs.extend(rights.into_iter().map(|right| (left, right)));
    }

    /// Right ids paired with `left`, ascending.
    pub async fn rights_of(&self, left: EntityId) -> Vec<EntityId> {
        self.pairs
            .read()
            .await
            .range((left, EntityId::MIN)..=(left, EntityId::MAX))
            .map(|(_, right)| *right)
            .collect()
    }

    /// Left ids paired with `right`, ascending.
    pub async fn lefts_of(&self, right: EntityId) -> Vec<EntityId> {
        self.pairs
            .read()
            .await
            .iter()
            .filter(|(_, r)| *r == right)
            .map(|(left, _)| *left)
            .collect()
    }

    pub async fn remove_left(&self, left: EntityId) {
        self.pairs.write().await.retain(|(l, _)| *l != left);
    }

    pub async fn remove_right(&self, right: EntityId) {
        self.pairs.write().await.retain(|(_, r)| *r != right);
    }

    pub async fn len(&self) -> usize {
        self.pairs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pairs.read().await.is_empty()
    }
}
