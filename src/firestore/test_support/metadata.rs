use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use crate::firestore::local::{QueryData, QueryPurpose};
use crate::firestore::model::{DocumentKey, ResourcePath, TargetId};
use crate::firestore::remote::TargetMetadataProvider;
use crate::firestore::test_support::path::{key, keys};

/// In-memory stand-in for the local store's view of its targets.
///
/// Tests keep a clone of the `Arc` to change remote keys or drop targets
/// between remote events, like the sync engine would after applying one.
#[derive(Default)]
pub struct TestTargetMetadata {
    query_data: Mutex<BTreeMap<TargetId, QueryData>>,
    remote_keys: Mutex<BTreeMap<TargetId, BTreeSet<DocumentKey>>>,
}

impl TestTargetMetadata {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers collection query targets listened to by the user.
    pub fn with_query_targets(target_ids: &[TargetId]) -> Arc<Self> {
        let metadata = Self::new();
        for target_id in target_ids {
            metadata.add_query_target(*target_id);
        }
        metadata
    }

    pub fn add_query_target(&self, target_id: TargetId) {
        let data = QueryData::for_query(target_id, ResourcePath::from_segments(["rooms"]));
        self.query_data.lock().unwrap().insert(target_id, data);
    }

    pub fn add_document_target(&self, target_id: TargetId, path: &str, purpose: QueryPurpose) {
        let data = QueryData::for_document(target_id, key(path), purpose);
        self.query_data.lock().unwrap().insert(target_id, data);
    }

    pub fn forget_target(&self, target_id: TargetId) {
        self.query_data.lock().unwrap().remove(&target_id);
        self.remote_keys.lock().unwrap().remove(&target_id);
    }

    pub fn set_remote_keys(&self, target_id: TargetId, paths: &[&str]) {
        self.remote_keys
            .lock()
            .unwrap()
            .insert(target_id, keys(paths));
    }
}

impl TargetMetadataProvider for TestTargetMetadata {
    fn remote_keys_for_target(&self, target_id: TargetId) -> BTreeSet<DocumentKey> {
        self.remote_keys
            .lock()
            .unwrap()
            .get(&target_id)
            .cloned()
            .unwrap_or_default()
    }

    fn query_data_for_target(&self, target_id: TargetId) -> Option<QueryData> {
        self.query_data.lock().unwrap().get(&target_id).cloned()
    }
}
