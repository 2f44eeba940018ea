//! Catalog data model.
//!
//! Catalog items are read-only at runtime; rows are seeded out of band and
//! only ever resolved by name or re-read inside a purchase transaction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable catalog item identifier assigned by the ledger's backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(i32);

impl ItemId {
    /// Wrap a raw storage identifier.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Access the raw storage identifier.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A purchasable catalog entry with its fixed price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    id: ItemId,
    name: String,
    price: i64,
}

impl CatalogItem {
    /// Assemble a catalog entry.
    pub fn new(id: ItemId, name: impl Into<String>, price: i64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }

    /// Ledger-assigned identifier.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Unique catalog name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Fixed price in coins.
    pub fn price(&self) -> i64 {
        self.price
    }
}
