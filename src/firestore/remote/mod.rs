pub mod remote_event;
pub mod target_state;
pub mod watch_change;
pub mod watch_change_aggregator;

pub use remote_event::{RemoteEvent, TargetChange};
pub use target_state::{ChangeType, TargetState};
pub use watch_change::{
    DocumentWatchChange, ExistenceFilter, ExistenceFilterWatchChange, WatchChange,
    WatchTargetChange, WatchTargetChangeState,
};
pub use watch_change_aggregator::{TargetMetadataProvider, WatchChangeAggregator};
