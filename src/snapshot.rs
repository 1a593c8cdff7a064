//! Saved document format.
//!
//! A document is `{"items": [...]}` where each entry is a flat [`ItemParams`]
//! map with short keys. Loading is lenient per entry: unknown type tags,
//! malformed entries and entries that could never have been created are
//! skipped with a warning. Only a top-level failure is an error.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Defaults;
use crate::item::{Item, ItemParams, ItemType};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid data")]
    InvalidData,
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct RawDocument {
    items: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct SavedDocument {
    items: Vec<ItemParams>,
}

/// Parse a saved document into items, filling gaps from `defaults`.
///
/// # Errors
///
/// Returns [`SnapshotError::InvalidData`] when `raw` is not a JSON object
/// with an `items` array.
pub fn parse(raw: &str, defaults: &Defaults) -> Result<Vec<Item>, SnapshotError> {
    let doc: RawDocument = serde_json::from_str(raw).map_err(|e| {
        debug!(error = %e, "document rejected");
        SnapshotError::InvalidData
    })?;

    let mut items = Vec::with_capacity(doc.items.len());
    for (index, entry) in doc.items.into_iter().enumerate() {
        let params: ItemParams = match serde_json::from_value(entry) {
            Ok(params) => params,
            Err(e) => {
                warn!(index, error = %e, "skipping malformed item");
                continue;
            }
        };
        let Some(item_type) = params.item_type else {
            warn!(index, "skipping item without a type");
            continue;
        };
        if !is_buildable(item_type, &params) {
            warn!(index, ?item_type, "skipping incomplete item");
            continue;
        }
        items.push(Item::build(item_type, &params, defaults));
    }
    Ok(items)
}

/// Serialize `items` in document order.
///
/// # Errors
///
/// Returns [`SnapshotError::Encode`] if serialization fails.
pub fn to_json(items: &[Item]) -> Result<String, SnapshotError> {
    let doc = SavedDocument { items: items.iter().map(Item::serialize).collect() };
    Ok(serde_json::to_string(&doc)?)
}

fn is_buildable(item_type: ItemType, params: &ItemParams) -> bool {
    match item_type {
        ItemType::Line => params.control_points.as_ref().is_some_and(|cps| cps.len() > 1),
        ItemType::Text => params.text.as_ref().is_some_and(|t| !t.trim().is_empty()),
        ItemType::Anchor | ItemType::Piton | ItemType::Rappel | ItemType::Belay => true,
    }
}
