//! Cart layout in the store.
//!
//! A cart lives under `cart:<owner>` as a list. After every write the list
//! holds exactly one element: a JSON array with the whole cart. Readers
//! concatenate all elements in list order, so a list holding several array
//! snapshots still decodes deterministically.

use serde::Serialize;

use crate::errors::ModelError;
use crate::item::Item;

pub const KEY_PREFIX: &str = "cart:";
pub const MAX_OWNER_LEN: usize = 128;

/// Store key for an owner's cart.
pub fn cart_key(owner: &str) -> String {
    format!("{KEY_PREFIX}{owner}")
}

pub fn validate_owner(owner: &str) -> Result<(), ModelError> {
    if owner.trim().is_empty() {
        return Err(ModelError::Validation("owner id required".into()));
    }
    if owner.len() > MAX_OWNER_LEN {
        return Err(ModelError::Validation(format!("owner id longer than {MAX_OWNER_LEN} bytes")));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub owner: String,
    pub items: Vec<Item>,
}

impl Cart {
    pub fn empty(owner: impl Into<String>) -> Self {
        Self { owner: owner.into(), items: Vec::new() }
    }

    /// Rebuild a cart from the raw list stored at its key.
    pub fn from_snapshots(owner: impl Into<String>, blobs: &[String]) -> Result<Self, ModelError> {
        let mut items = Vec::new();
        for (idx, blob) in blobs.iter().enumerate() {
            let snapshot: Vec<Item> = serde_json::from_str(blob)
                .map_err(|e| ModelError::Decode(format!("snapshot {idx}: {e}")))?;
            items.extend(snapshot);
        }
        Ok(Self { owner: owner.into(), items })
    }

    pub fn key(&self) -> String {
        cart_key(&self.owner)
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// The single blob that replaces the list on write.
    pub fn to_snapshot(&self) -> Result<String, ModelError> {
        serde_json::to_string(&self.items).map_err(|e| ModelError::Decode(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
