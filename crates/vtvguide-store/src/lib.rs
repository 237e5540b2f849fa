//! Schedule persistence module.
//!
//! Stores one JSON record per (tuner, channel) under the cache directory
//! so repeated guide refreshes see the same timeline.

/// Record read/write primitive.
pub mod record;
/// Channel schedule data model.
pub mod schedule;
mod store;

#[allow(clippy::module_name_repetitions)]
pub use record::{FsRecordStore, RecordStore};
pub use schedule::{ChannelSchedule, ScheduleEntry};
#[allow(clippy::module_name_repetitions)]
pub use store::{ScheduleStore, TUNER_TYPE};
