use std::collections::{BTreeMap, BTreeSet};

use crate::firestore::error::FirestoreError;
use crate::firestore::model::{DocumentKey, MaybeDocument, ResumeToken, SnapshotVersion, TargetId};

/// Aggregated result of applying a batch of watch changes, consistent as of
/// `snapshot_version`.
#[derive(Debug, Clone, Default)]
pub struct RemoteEvent {
    pub snapshot_version: SnapshotVersion,
    /// Changes for every target that changed since the previous event.
    pub target_changes: BTreeMap<TargetId, TargetChange>,
    /// Targets whose local state can no longer be trusted. Their listens
    /// must be re-established without a resume token.
    pub target_mismatches: BTreeSet<TargetId>,
    /// Latest known state of every document touched since the previous event.
    pub document_updates: BTreeMap<DocumentKey, MaybeDocument>,
    /// Updated documents that only belong to limbo resolution targets.
    pub resolved_limbo_documents: BTreeSet<DocumentKey>,
    /// Causes reported by the server for targets it stopped watching.
    pub target_errors: BTreeMap<TargetId, FirestoreError>,
}

impl RemoteEvent {
    pub fn is_empty(&self) -> bool {
        self.target_changes.is_empty()
            && self.document_updates.is_empty()
            && self.target_mismatches.is_empty()
            && self.resolved_limbo_documents.is_empty()
            && self.target_errors.is_empty()
    }
}

/// The changes of a single target within a [`RemoteEvent`].
///
/// Only document keys are tracked here; the documents themselves live in
/// [`RemoteEvent::document_updates`] since one document may belong to many
/// targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetChange {
    resume_token: ResumeToken,
    current: bool,
    added_documents: BTreeSet<DocumentKey>,
    modified_documents: BTreeSet<DocumentKey>,
    removed_documents: BTreeSet<DocumentKey>,
}

impl TargetChange {
    pub fn new(
        resume_token: ResumeToken,
        current: bool,
        added_documents: BTreeSet<DocumentKey>,
        modified_documents: BTreeSet<DocumentKey>,
        removed_documents: BTreeSet<DocumentKey>,
    ) -> Self {
        Self {
            resume_token,
            current,
            added_documents,
            modified_documents,
            removed_documents,
        }
    }

    /// Position from which the target can be resumed after a reconnect.
    pub fn resume_token(&self) -> &ResumeToken {
        &self.resume_token
    }

    /// Whether the server has sent every change up to the point the target
    /// was added and the target is consistent with the rest of the stream.
    pub fn current(&self) -> bool {
        self.current
    }

    pub fn added_documents(&self) -> &BTreeSet<DocumentKey> {
        &self.added_documents
    }

    pub fn modified_documents(&self) -> &BTreeSet<DocumentKey> {
        &self.modified_documents
    }

    pub fn removed_documents(&self) -> &BTreeSet<DocumentKey> {
        &self.removed_documents
    }

    pub fn has_document_changes(&self) -> bool {
        !(self.added_documents.is_empty()
            && self.modified_documents.is_empty()
            && self.removed_documents.is_empty())
    }
}
