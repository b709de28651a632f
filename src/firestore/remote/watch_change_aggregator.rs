use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::firestore::error::FirestoreError;
use crate::firestore::local::{QueryData, QueryPurpose};
use crate::firestore::model::{DocumentKey, MaybeDocument, SnapshotVersion, TargetId};
use crate::firestore::remote::remote_event::{RemoteEvent, TargetChange};
use crate::firestore::remote::target_state::{ChangeType, TargetState};
use crate::firestore::remote::watch_change::{
    DocumentWatchChange, ExistenceFilterWatchChange, WatchChange, WatchTargetChange,
    WatchTargetChangeState,
};

/// Exposes the local store's knowledge about targets to the aggregator.
///
/// Implementations are called synchronously while a watch change is being
/// applied and must not call back into the aggregator.
pub trait TargetMetadataProvider: Send + Sync {
    /// Document keys that belong to the target as of the last raised
    /// remote event.
    fn remote_keys_for_target(&self, target_id: TargetId) -> BTreeSet<DocumentKey>;

    /// Query data of a target the client still listens to, or `None` once
    /// the target became inactive.
    fn query_data_for_target(&self, target_id: TargetId) -> Option<QueryData>;
}

/// Accumulates watch changes into [`RemoteEvent`]s.
///
/// Changes for targets that are not active (unknown, removed, or awaiting
/// the server's acknowledgement of a listen request) are dropped. A target
/// reset leaves the outstanding request counter untouched: the server keeps
/// streaming the target after a `RESET`, so it stays active and accepts the
/// documents that are sent again.
pub struct WatchChangeAggregator<P>
where
    P: TargetMetadataProvider + ?Sized,
{
    metadata: Arc<P>,
    target_states: HashMap<TargetId, TargetState>,
    /// Documents to update since the last raised event.
    pending_document_updates: HashMap<DocumentKey, MaybeDocument>,
    /// Targets touched by each pending document.
    pending_document_target_mappings: HashMap<DocumentKey, BTreeSet<TargetId>>,
    /// Targets whose listens have to be re-established from scratch.
    pending_target_resets: BTreeSet<TargetId>,
    pending_target_errors: BTreeMap<TargetId, FirestoreError>,
}

impl<P> WatchChangeAggregator<P>
where
    P: TargetMetadataProvider + ?Sized,
{
    pub fn new(metadata: Arc<P>) -> Self {
        Self {
            metadata,
            target_states: HashMap::new(),
            pending_document_updates: HashMap::new(),
            pending_document_target_mappings: HashMap::new(),
            pending_target_resets: BTreeSet::new(),
            pending_target_errors: BTreeMap::new(),
        }
    }

    pub fn handle_watch_change(&mut self, change: WatchChange) {
        match change {
            WatchChange::Document(change) => self.handle_document_change(change),
            WatchChange::Target(change) => self.handle_target_change(change),
            WatchChange::ExistenceFilter(change) => self.handle_existence_filter(change),
        }
    }

    /// Applies a document update or removal to every target it names.
    pub fn handle_document_change(&mut self, change: DocumentWatchChange) {
        let DocumentWatchChange {
            added_target_ids,
            removed_target_ids,
            document_key,
            document,
        } = change;

        for target_id in added_target_ids {
            match &document {
                Some(found @ MaybeDocument::Document(_)) => {
                    self.add_document_to_target(target_id, &document_key, found.clone());
                }
                Some(tombstone) => {
                    self.remove_document_from_target(
                        target_id,
                        &document_key,
                        Some(tombstone.clone()),
                    );
                }
                None => {}
            }
        }

        for target_id in removed_target_ids {
            self.remove_document_from_target(target_id, &document_key, document.clone());
        }
    }

    /// Applies a target state change to the targets it names, or to all
    /// active targets when it names none.
    pub fn handle_target_change(&mut self, change: WatchTargetChange) {
        for target_id in self.target_ids(&change) {
            match change.state {
                WatchTargetChangeState::NoChange => {
                    if self.is_active_target(target_id) {
                        if let Some(state) = self.target_states.get_mut(&target_id) {
                            state.update_resume_token(&change.resume_token);
                        }
                    }
                }
                WatchTargetChangeState::Added => {
                    let Some(state) = self.target_states.get_mut(&target_id) else {
                        log::debug!("ignoring ADD for unknown target {target_id}");
                        continue;
                    };
                    if state.outstanding_responses() == 0 {
                        log::warn!("ignoring ADD for target {target_id} without a pending request");
                        continue;
                    }
                    state.record_target_response();
                    if !state.is_pending() {
                        // Drop whatever a previous listen of this target left
                        // behind, e.g. after re-listening on a mismatch.
                        state.clear_pending_changes();
                    }
                    state.update_resume_token(&change.resume_token);
                }
                WatchTargetChangeState::Removed => {
                    let Some(state) = self.target_states.get_mut(&target_id) else {
                        log::debug!("ignoring REMOVE for unknown target {target_id}");
                        continue;
                    };
                    let requested = state.outstanding_responses() > 0;
                    if requested {
                        state.record_target_response();
                    }
                    let still_pending = state.is_pending();

                    if let Some(cause) = &change.cause {
                        // The server stopped watching the target; the caller
                        // decides whether to listen again.
                        log::warn!("watch target {target_id} removed by the server: {cause}");
                        self.pending_target_resets.insert(target_id);
                        self.pending_target_errors.insert(target_id, cause.clone());
                        self.remove_target(target_id);
                    } else if !requested {
                        log::warn!(
                            "ignoring REMOVE for target {target_id} without a pending request"
                        );
                    } else if !still_pending {
                        self.remove_target(target_id);
                    }
                }
                WatchTargetChangeState::Current => {
                    if self.is_active_target(target_id) {
                        if let Some(state) = self.target_states.get_mut(&target_id) {
                            state.mark_current();
                            state.update_resume_token(&change.resume_token);
                        }
                    }
                }
                WatchTargetChangeState::Reset => {
                    if self.is_active_target(target_id) {
                        // Synthesize removes for all known documents; the
                        // server re-adds the ones that still match before
                        // the next consistent snapshot.
                        self.reset_target(target_id);
                        if let Some(state) = self.target_states.get_mut(&target_id) {
                            state.update_resume_token(&change.resume_token);
                        }
                    }
                }
            }
        }
    }

    /// Compares the server's document count for a target with the local
    /// view and resets the target when they disagree.
    pub fn handle_existence_filter(&mut self, change: ExistenceFilterWatchChange) {
        let target_id = change.target_id;
        let expected_count = change.expected_count();

        let Some(query_data) = self.query_data_for_active_target(target_id) else {
            log::debug!("ignoring existence filter for inactive target {target_id}");
            return;
        };

        if let Some(key) = query_data.document_key() {
            match expected_count {
                0 => {
                    // The document does not exist; the server never sends a
                    // delete for a document the client has not seen.
                    log::debug!("existence filter reports {key} as deleted");
                    let deleted = MaybeDocument::deleted(key.clone(), SnapshotVersion::none());
                    self.remove_document_from_target(target_id, key, Some(deleted));
                }
                1 => {}
                other => {
                    log::warn!(
                        "existence filter for document target {target_id} reported {other} documents"
                    );
                    self.reset_target(target_id);
                    self.pending_target_resets.insert(target_id);
                }
            }
            return;
        }

        let current_count = self.current_document_count_for_target(target_id);
        if current_count != expected_count {
            log::debug!(
                "existence filter mismatch for target {target_id}: expected {expected_count}, have {current_count}"
            );
            self.reset_target(target_id);
            self.pending_target_resets.insert(target_id);
        }
    }

    /// Raises everything accumulated since the previous call as a single
    /// event and clears the per-snapshot state.
    pub fn create_remote_event(&mut self, snapshot_version: SnapshotVersion) -> RemoteEvent {
        let mut target_ids: Vec<TargetId> = self.target_states.keys().copied().collect();
        target_ids.sort_unstable();

        let mut target_changes: BTreeMap<TargetId, TargetChange> = BTreeMap::new();
        for target_id in target_ids {
            let query_data = self.query_data_for_active_target(target_id);

            if let Some(key) = query_data.as_ref().and_then(QueryData::document_key) {
                let is_current = self
                    .target_states
                    .get(&target_id)
                    .is_some_and(TargetState::current);
                if is_current
                    && !self.pending_document_updates.contains_key(key)
                    && !self.target_contains_document(target_id, key)
                {
                    // A current document target without its document means
                    // the document does not exist.
                    log::debug!("synthesizing delete for {key} on target {target_id}");
                    let deleted = MaybeDocument::deleted(key.clone(), snapshot_version);
                    self.remove_document_from_target(target_id, key, Some(deleted));
                }
            }

            let include_mismatch = self.pending_target_resets.contains(&target_id);
            let Some(state) = self.target_states.get_mut(&target_id) else {
                continue;
            };
            if (query_data.is_some() && state.has_pending_changes()) || include_mismatch {
                target_changes.insert(target_id, state.to_target_change());
                state.clear_pending_changes();
            }
        }

        let resolved_limbo_documents = self.resolved_limbo_documents();

        let event = RemoteEvent {
            snapshot_version,
            target_changes,
            target_mismatches: std::mem::take(&mut self.pending_target_resets),
            document_updates: std::mem::take(&mut self.pending_document_updates)
                .into_iter()
                .collect(),
            resolved_limbo_documents,
            target_errors: std::mem::take(&mut self.pending_target_errors),
        };
        self.pending_document_target_mappings.clear();

        log::trace!(
            "raised remote event with {} target changes, {} document updates and {} mismatches",
            event.target_changes.len(),
            event.document_updates.len(),
            event.target_mismatches.len()
        );
        event
    }

    /// Drops the state of a target; unknown targets are ignored.
    pub fn remove_target(&mut self, target_id: TargetId) {
        self.target_states.remove(&target_id);
        self.purge_target_mappings(target_id);
    }

    /// Records that a listen or unlisten request was sent for a target and
    /// that its changes should be ignored until the server acknowledges it.
    pub fn record_pending_target_request(&mut self, target_id: TargetId) {
        self.target_states
            .entry(target_id)
            .or_default()
            .record_pending_target_request();
    }

    pub fn target_state(&self, target_id: TargetId) -> Option<&TargetState> {
        self.target_states.get(&target_id)
    }

    fn target_ids(&self, change: &WatchTargetChange) -> Vec<TargetId> {
        if !change.target_ids.is_empty() {
            return change.target_ids.clone();
        }

        let mut active: Vec<TargetId> = self
            .target_states
            .keys()
            .copied()
            .filter(|target_id| self.is_active_target(*target_id))
            .collect();
        active.sort_unstable();
        active
    }

    fn add_document_to_target(
        &mut self,
        target_id: TargetId,
        key: &DocumentKey,
        document: MaybeDocument,
    ) {
        if !self.is_active_target(target_id) {
            return;
        }

        let in_remote_keys = self.metadata.remote_keys_for_target(target_id).contains(key);
        let Some(state) = self.target_states.get_mut(&target_id) else {
            return;
        };
        let change_type = match state.document_change(key) {
            Some(ChangeType::Added) => ChangeType::Added,
            _ if in_remote_keys => ChangeType::Modified,
            _ => ChangeType::Added,
        };
        state.add_document_change(key.clone(), change_type);

        self.pending_document_updates.insert(key.clone(), document);
        self.pending_document_target_mappings
            .entry(key.clone())
            .or_default()
            .insert(target_id);
    }

    /// Removes `key` from the target. `updated_document` carries the new
    /// state of the document when it is known, e.g. a tombstone.
    fn remove_document_from_target(
        &mut self,
        target_id: TargetId,
        key: &DocumentKey,
        updated_document: Option<MaybeDocument>,
    ) {
        if !self.is_active_target(target_id) {
            return;
        }

        if !self.pending_target_resets.contains(&target_id) {
            let in_remote_keys = self.metadata.remote_keys_for_target(target_id).contains(key);
            let Some(state) = self.target_states.get_mut(&target_id) else {
                return;
            };
            if in_remote_keys {
                state.add_document_change(key.clone(), ChangeType::Removed);
            } else {
                // Added and removed within the same snapshot.
                state.remove_document_change(key);
            }
            self.pending_document_target_mappings
                .entry(key.clone())
                .or_default()
                .insert(target_id);
        }

        if let Some(document) = updated_document {
            self.pending_document_updates.insert(key.clone(), document);
        }
    }

    /// Number of documents in the target: the remote keys of the last event
    /// adjusted by the changes accumulated since.
    fn current_document_count_for_target(&self, target_id: TargetId) -> usize {
        let remote_count = self.metadata.remote_keys_for_target(target_id).len();
        let Some(state) = self.target_states.get(&target_id) else {
            return remote_count;
        };

        let (added, removed) =
            state
                .document_changes()
                .fold((0usize, 0usize), |(added, removed), (_, change)| match change {
                    ChangeType::Added => (added + 1, removed),
                    ChangeType::Removed => (added, removed + 1),
                    ChangeType::Modified | ChangeType::Metadata => (added, removed),
                });
        (remote_count + added).saturating_sub(removed)
    }

    fn is_active_target(&self, target_id: TargetId) -> bool {
        self.query_data_for_active_target(target_id).is_some()
    }

    /// Query data of a target that has no outstanding requests and that the
    /// client still listens to.
    fn query_data_for_active_target(&self, target_id: TargetId) -> Option<QueryData> {
        match self.target_states.get(&target_id) {
            Some(state) if !state.is_pending() => self.metadata.query_data_for_target(target_id),
            _ => None,
        }
    }

    /// Returns the target to its just-listened state: not current, no
    /// resume token, and a removal for every document it held.
    fn reset_target(&mut self, target_id: TargetId) {
        let remote_keys = self.metadata.remote_keys_for_target(target_id);
        let Some(state) = self.target_states.get_mut(&target_id) else {
            return;
        };

        let outstanding_responses = state.outstanding_responses();
        *state = TargetState::with_outstanding_responses(outstanding_responses);
        for key in remote_keys {
            state.add_document_change(key, ChangeType::Removed);
        }
        self.purge_target_mappings(target_id);
    }

    fn target_contains_document(&self, target_id: TargetId, key: &DocumentKey) -> bool {
        if self.metadata.remote_keys_for_target(target_id).contains(key) {
            return true;
        }
        matches!(
            self.target_states
                .get(&target_id)
                .and_then(|state| state.document_change(key)),
            Some(ChangeType::Added | ChangeType::Modified | ChangeType::Metadata)
        )
    }

    fn purge_target_mappings(&mut self, target_id: TargetId) {
        self.pending_document_target_mappings.retain(|_, targets| {
            targets.remove(&target_id);
            !targets.is_empty()
        });
    }

    /// Documents whose only active targets are limbo resolutions.
    fn resolved_limbo_documents(&self) -> BTreeSet<DocumentKey> {
        self.pending_document_target_mappings
            .iter()
            .filter(|(_, targets)| {
                targets.iter().all(|target_id| {
                    self.query_data_for_active_target(*target_id)
                        .map_or(true, |data| data.purpose == QueryPurpose::LimboResolution)
                })
            })
            .map(|(key, _)| key.clone())
            .collect()
    }
}
