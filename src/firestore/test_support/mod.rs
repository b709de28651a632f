//! Test utilities shared across the watch aggregation unit tests.

pub mod metadata;
pub mod path;

pub use metadata::TestTargetMetadata;
pub use path::{deleted_doc, doc, key, keys, version};
