//! Per-user favorite product sets.

use chrono::{DateTime, Utc};
use oceanfood_core::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::db::UserDocument;

/// A user's favorites: a duplicate-free list of products in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Favorite {
    /// Whether `product` is in the set.
    #[must_use]
    pub fn contains(&self, product: ProductId) -> bool {
        self.product_ids.contains(&product)
    }

    /// Insert `product`. Returns `false` if it was already present.
    pub fn add(&mut self, product: ProductId) -> bool {
        if self.contains(product) {
            return false;
        }
        self.product_ids.push(product);
        true
    }

    /// Remove `product`. Returns `false` if it was not present.
    pub fn remove(&mut self, product: ProductId) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|id| *id != product);
        self.product_ids.len() != before
    }

    /// Empty the set. Returns `false` if it was already empty.
    pub fn clear(&mut self) -> bool {
        let changed = !self.product_ids.is_empty();
        self.product_ids.clear();
        changed
    }
}

impl UserDocument for Favorite {
    fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            product_ids: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn stamp(&mut self, version: i64, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = at;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut favorite = Favorite::empty(UserId::parse("u1").unwrap(), Utc::now());
        let product = ProductId::generate();
        assert!(favorite.add(product));
        assert!(!favorite.add(product));
        assert_eq!(favorite.product_ids, vec![product]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut favorite = Favorite::empty(UserId::parse("u1").unwrap(), Utc::now());
        let kept = ProductId::generate();
        favorite.add(kept);
        assert!(!favorite.remove(ProductId::generate()));
        assert_eq!(favorite.product_ids, vec![kept]);
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut favorite = Favorite::empty(UserId::parse("u1").unwrap(), Utc::now());
        let ids: Vec<ProductId> = (0..4).map(|_| ProductId::generate()).collect();
        for id in &ids {
            favorite.add(*id);
        }
        assert_eq!(favorite.product_ids, ids);
    }
}
