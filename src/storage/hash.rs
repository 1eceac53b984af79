//! Content-derived identifiers.
//!
//! An id is a name-based UUID (v5, SHA-1) in the nil namespace over the JSON
//! encoding of the content. JSON of a struct with ordered maps has a fixed
//! field order, so equal content yields equal bytes on every run.

use serde::Serialize;
use uuid::Uuid;

use crate::storage::StorageError;

/// Serialize `content` canonically.
pub fn canonical_bytes<T: Serialize + ?Sized>(content: &T) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec(content)?)
}

/// Derive the deterministic identifier of `content`.
pub fn derive_id<T: Serialize + ?Sized>(content: &T) -> Result<Uuid, StorageError> {
    let bytes = canonical_bytes(content)?;
    Ok(Uuid::new_v5(&Uuid::nil(), &bytes))
}
