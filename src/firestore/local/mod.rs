pub mod query_data;

#[doc(inline)]
pub use query_data::{QueryData, QueryPurpose, TargetKind};
