use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::firestore::error::{invalid_argument, FirestoreError};
use crate::firestore::model::{DocumentKey, MaybeDocument, ResumeToken, TargetId};

/// A structured message received on the watch stream.
#[derive(Debug, Clone)]
pub enum WatchChange {
    Document(DocumentWatchChange),
    Target(WatchTargetChange),
    ExistenceFilter(ExistenceFilterWatchChange),
}

impl From<DocumentWatchChange> for WatchChange {
    fn from(value: DocumentWatchChange) -> Self {
        WatchChange::Document(value)
    }
}

impl From<WatchTargetChange> for WatchChange {
    fn from(value: WatchTargetChange) -> Self {
        WatchChange::Target(value)
    }
}

impl From<ExistenceFilterWatchChange> for WatchChange {
    fn from(value: ExistenceFilterWatchChange) -> Self {
        WatchChange::ExistenceFilter(value)
    }
}

/// A document changed, was deleted, or stopped matching some targets.
///
/// `document` is `None` when the server only reported that the document no
/// longer matches `removed_target_ids`.
#[derive(Debug, Clone)]
pub struct DocumentWatchChange {
    pub added_target_ids: Vec<TargetId>,
    pub removed_target_ids: Vec<TargetId>,
    pub document_key: DocumentKey,
    pub document: Option<MaybeDocument>,
}

impl DocumentWatchChange {
    pub fn new(
        added_target_ids: Vec<TargetId>,
        removed_target_ids: Vec<TargetId>,
        document_key: DocumentKey,
        document: Option<MaybeDocument>,
    ) -> Self {
        Self {
            added_target_ids,
            removed_target_ids,
            document_key,
            document,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchTargetChangeState {
    NoChange,
    #[serde(rename = "ADD")]
    Added,
    #[serde(rename = "REMOVE")]
    Removed,
    Current,
    Reset,
}

impl FromStr for WatchTargetChangeState {
    type Err = FirestoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "NO_CHANGE" => Ok(WatchTargetChangeState::NoChange),
            "ADD" => Ok(WatchTargetChangeState::Added),
            "REMOVE" => Ok(WatchTargetChangeState::Removed),
            "CURRENT" => Ok(WatchTargetChangeState::Current),
            "RESET" => Ok(WatchTargetChangeState::Reset),
            other => Err(invalid_argument(format!(
                "Unknown target change type: {other}"
            ))),
        }
    }
}

/// A state change for a set of targets. An empty `target_ids` list applies
/// the change to every active target.
#[derive(Debug, Clone)]
pub struct WatchTargetChange {
    pub state: WatchTargetChangeState,
    pub target_ids: Vec<TargetId>,
    pub resume_token: ResumeToken,
    pub cause: Option<FirestoreError>,
}

impl WatchTargetChange {
    pub fn new(state: WatchTargetChangeState, target_ids: Vec<TargetId>) -> Self {
        Self {
            state,
            target_ids,
            resume_token: ResumeToken::empty(),
            cause: None,
        }
    }

    pub fn with_resume_token(mut self, resume_token: impl Into<ResumeToken>) -> Self {
        self.resume_token = resume_token.into();
        self
    }

    pub fn with_cause(mut self, cause: FirestoreError) -> Self {
        self.cause = Some(cause);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistenceFilter {
    pub count: usize,
}

impl ExistenceFilter {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

/// The number of documents the server believes match a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistenceFilterWatchChange {
    pub target_id: TargetId,
    pub existence_filter: ExistenceFilter,
}

impl ExistenceFilterWatchChange {
    pub fn new(target_id: TargetId, expected_count: usize) -> Self {
        Self {
            target_id,
            existence_filter: ExistenceFilter::new(expected_count),
        }
    }

    pub fn expected_count(&self) -> usize {
        self.existence_filter.count
    }
}
