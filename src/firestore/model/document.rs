use serde_json::{Map, Value as JsonValue};

use crate::firestore::model::{DocumentKey, SnapshotVersion};

/// Field data of a document as decoded by the transport layer.
pub type DocumentFields = Map<String, JsonValue>;

/// Latest state of a document as reported by the watch stream.
#[derive(Clone, Debug, PartialEq)]
pub enum MaybeDocument {
    /// The document exists with the given contents.
    Document(Document),
    /// The document is known not to exist at `version`.
    NoDocument { key: DocumentKey, version: SnapshotVersion },
    /// The document exists but its contents are not known, for instance
    /// when only a document mask was sent.
    UnknownDocument { key: DocumentKey, version: SnapshotVersion },
}

impl MaybeDocument {
    pub fn found(key: DocumentKey, version: SnapshotVersion, fields: DocumentFields) -> Self {
        MaybeDocument::Document(Document::new(key, version, fields))
    }

    pub fn deleted(key: DocumentKey, version: SnapshotVersion) -> Self {
        MaybeDocument::NoDocument { key, version }
    }

    pub fn unknown(key: DocumentKey, version: SnapshotVersion) -> Self {
        MaybeDocument::UnknownDocument { key, version }
    }

    pub fn key(&self) -> &DocumentKey {
        match self {
            MaybeDocument::Document(document) => &document.key,
            MaybeDocument::NoDocument { key, .. } | MaybeDocument::UnknownDocument { key, .. } => {
                key
            }
        }
    }

    pub fn version(&self) -> SnapshotVersion {
        match self {
            MaybeDocument::Document(document) => document.version,
            MaybeDocument::NoDocument { version, .. }
            | MaybeDocument::UnknownDocument { version, .. } => *version,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MaybeDocument::Document(_))
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            MaybeDocument::Document(document) => Some(document),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub key: DocumentKey,
    pub version: SnapshotVersion,
    pub fields: DocumentFields,
}

impl Document {
    pub fn new(key: DocumentKey, version: SnapshotVersion, fields: DocumentFields) -> Self {
        Self {
            key,
            version,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::model::Timestamp;
    use serde_json::json;

    #[test]
    fn exposes_key_and_version_for_every_variant() {
        let key = DocumentKey::from_string("cities/sf").unwrap();
        let version = SnapshotVersion::new(Timestamp::new(5, 0));

        let mut fields = DocumentFields::new();
        fields.insert("population".into(), json!(870_000));
        let found = MaybeDocument::found(key.clone(), version, fields);
        let deleted = MaybeDocument::deleted(key.clone(), SnapshotVersion::none());
        let unknown = MaybeDocument::unknown(key.clone(), version);

        assert!(found.is_found());
        assert_eq!(
            found.as_document().and_then(|doc| doc.fields.get("population")),
            Some(&json!(870_000))
        );
        assert!(!deleted.is_found());
        assert!(unknown.as_document().is_none());
        for doc in [&found, &deleted, &unknown] {
            assert_eq!(doc.key(), &key);
        }
        assert_eq!(found.version(), version);
        assert!(deleted.version().is_none());
    }
}
