use serde::{Deserialize, Serialize};

use crate::firestore::model::Timestamp;

/// Logical point in time at which the watch stream is consistent.
///
/// Versions are supplied by the caller when a remote event is raised and are
/// only ever compared; `SnapshotVersion::none()` sorts before every real
/// version and stamps documents whose deletion was inferred rather than
/// reported.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SnapshotVersion(Timestamp);

impl SnapshotVersion {
    pub fn new(timestamp: Timestamp) -> Self {
        Self(timestamp)
    }

    pub fn none() -> Self {
        Self(Timestamp::default())
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.0
    }
}

impl From<Timestamp> for SnapshotVersion {
    fn from(value: Timestamp) -> Self {
        Self::new(value)
    }
}
