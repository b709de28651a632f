mod document;
mod document_key;
mod resource_path;
mod resume_token;
mod snapshot_version;
mod timestamp;

pub use document::{Document, DocumentFields, MaybeDocument};
pub use document_key::DocumentKey;
pub use resource_path::ResourcePath;
pub use resume_token::ResumeToken;
pub use snapshot_version::SnapshotVersion;
pub use timestamp::Timestamp;

/// Identifier of an active listen ("target") on the watch stream.
pub type TargetId = i32;
