use std::collections::{BTreeSet, HashMap};

use crate::firestore::model::{DocumentKey, ResumeToken};
use crate::firestore::remote::remote_event::TargetChange;

/// How a document changed relative to the last raised snapshot of a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
    Metadata,
}

/// Tracks the internal state of a watch target.
#[derive(Debug, Clone)]
pub struct TargetState {
    /// Adds or removes sent to the server that it has not acknowledged yet.
    /// Only targets without outstanding responses are considered active.
    outstanding_responses: i32,
    /// Document changes since the last raised snapshot.
    document_changes: HashMap<DocumentKey, ChangeType>,
    resume_token: ResumeToken,
    current: bool,
    /// Starts out true so that a freshly added target is part of the next
    /// remote event even without document changes.
    has_pending_changes: bool,
}

impl Default for TargetState {
    fn default() -> Self {
        Self {
            outstanding_responses: 0,
            document_changes: HashMap::new(),
            resume_token: ResumeToken::empty(),
            current: false,
            has_pending_changes: true,
        }
    }
}

impl TargetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh state that still waits for `outstanding_responses` acks.
    pub(crate) fn with_outstanding_responses(outstanding_responses: i32) -> Self {
        Self {
            outstanding_responses,
            ..Self::default()
        }
    }

    /// Whether the server marked this target `CURRENT`.
    pub fn current(&self) -> bool {
        self.current
    }

    /// The last resume token sent for this target.
    pub fn resume_token(&self) -> &ResumeToken {
        &self.resume_token
    }

    /// Whether there are adds or removes the server has not acknowledged.
    pub fn is_pending(&self) -> bool {
        self.outstanding_responses != 0
    }

    pub fn outstanding_responses(&self) -> i32 {
        self.outstanding_responses
    }

    /// Whether this target should be part of the next remote event.
    pub fn has_pending_changes(&self) -> bool {
        self.has_pending_changes
    }

    pub fn document_change(&self, key: &DocumentKey) -> Option<ChangeType> {
        self.document_changes.get(key).copied()
    }

    pub(crate) fn document_changes(&self) -> impl Iterator<Item = (&DocumentKey, ChangeType)> {
        self.document_changes.iter().map(|(key, change)| (key, *change))
    }

    /// Stores `token` unless it is empty.
    pub fn update_resume_token(&mut self, token: &ResumeToken) {
        if !token.is_empty() {
            self.has_pending_changes = true;
            self.resume_token = token.clone();
        }
    }

    /// Builds a `TargetChange` from the accumulated changes. Call
    /// `clear_pending_changes` once the change has been raised.
    pub fn to_target_change(&self) -> TargetChange {
        let mut added = BTreeSet::new();
        let mut modified = BTreeSet::new();
        let mut removed = BTreeSet::new();

        for (key, change) in &self.document_changes {
            match change {
                ChangeType::Added => added.insert(key.clone()),
                ChangeType::Modified | ChangeType::Metadata => modified.insert(key.clone()),
                ChangeType::Removed => removed.insert(key.clone()),
            };
        }

        TargetChange::new(
            self.resume_token.clone(),
            self.current,
            added,
            modified,
            removed,
        )
    }

    pub fn clear_pending_changes(&mut self) {
        self.has_pending_changes = false;
        self.document_changes.clear();
    }

    pub fn add_document_change(&mut self, key: DocumentKey, change: ChangeType) {
        self.has_pending_changes = true;
        self.document_changes.insert(key, change);
    }

    pub fn remove_document_change(&mut self, key: &DocumentKey) {
        self.has_pending_changes = true;
        self.document_changes.remove(key);
    }

    pub fn record_pending_target_request(&mut self) {
        self.outstanding_responses += 1;
    }

    pub fn record_target_response(&mut self) {
        self.outstanding_responses -= 1;
    }

    pub fn mark_current(&mut self) {
        self.has_pending_changes = true;
        self.current = true;
    }
}
