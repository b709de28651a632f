use std::collections::BTreeSet;

use serde_json::Value as JsonValue;

use crate::firestore::model::{
    DocumentFields, DocumentKey, MaybeDocument, SnapshotVersion, Timestamp,
};

pub fn key(path: &str) -> DocumentKey {
    DocumentKey::from_string(path).expect("test document path")
}

pub fn keys(paths: &[&str]) -> BTreeSet<DocumentKey> {
    paths.iter().map(|path| key(path)).collect()
}

pub fn version(seconds: i64) -> SnapshotVersion {
    SnapshotVersion::new(Timestamp::new(seconds, 0))
}

/// Builds a found document from a JSON object literal.
pub fn doc(path: &str, seconds: i64, fields: JsonValue) -> MaybeDocument {
    let fields = match fields {
        JsonValue::Object(map) => map,
        _ => DocumentFields::new(),
    };
    MaybeDocument::found(key(path), version(seconds), fields)
}

pub fn deleted_doc(path: &str, seconds: i64) -> MaybeDocument {
    MaybeDocument::deleted(key(path), version(seconds))
}
