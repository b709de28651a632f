use crate::firestore::model::{DocumentKey, ResourcePath, TargetId};

/// Why the local store is listening to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryPurpose {
    /// A regular listen issued on behalf of a user query.
    Listen,
    /// The target resolves a single document whose state is in limbo.
    LimboResolution,
}

/// What a target watches: a query over a collection or one document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Query { path: ResourcePath },
    Document(DocumentKey),
}

/// Metadata the local store keeps for each target it listens to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryData {
    pub target_id: TargetId,
    pub target: TargetKind,
    pub purpose: QueryPurpose,
}

impl QueryData {
    pub fn new(target_id: TargetId, target: TargetKind, purpose: QueryPurpose) -> Self {
        Self {
            target_id,
            target,
            purpose,
        }
    }

    /// Query data for a collection query listened to by the user.
    pub fn for_query(target_id: TargetId, path: ResourcePath) -> Self {
        Self::new(target_id, TargetKind::Query { path }, QueryPurpose::Listen)
    }

    /// Query data for a single-document target.
    pub fn for_document(target_id: TargetId, key: DocumentKey, purpose: QueryPurpose) -> Self {
        Self::new(target_id, TargetKind::Document(key), purpose)
    }

    /// Returns the watched key when this target is a document target.
    pub fn document_key(&self) -> Option<&DocumentKey> {
        match &self.target {
            TargetKind::Document(key) => Some(key),
            TargetKind::Query { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_targets_expose_their_key() {
        let key = DocumentKey::from_string("cities/sf").unwrap();
        let data = QueryData::for_document(3, key.clone(), QueryPurpose::LimboResolution);
        assert_eq!(data.document_key(), Some(&key));

        let query = QueryData::for_query(4, ResourcePath::from_segments(["cities"]));
        assert_eq!(query.document_key(), None);
        assert_eq!(query.purpose, QueryPurpose::Listen);
    }
}
