//! Virtual channel scheduling.
//!
//! Turns a user's favorite library items into a gap-free broadcast
//! timeline per channel, keeps it fresh on demand, and answers guide
//! and playback queries against it.

/// Schedule layout and extension.
pub mod builder;
/// Static channel lineup and catalog filters.
pub mod channels;
/// Time source abstraction.
pub mod clock;
mod error;
mod locks;
mod maintainer;
/// Tuner and guide options.
pub mod options;
/// Guide program queries and playback resolution.
pub mod query;
#[cfg(test)]
mod testing;
mod tuner;

pub use channels::{ChannelInfo, ChannelKind, channel_lineup, resolve_query};
pub use clock::{Clock, SystemClock, round_to_hour};
pub use error::GuideError;
pub use locks::KeyedLocks;
pub use options::{GuideOptions, TunerConfig};
pub use query::{GuideProgram, program_entry_id};
pub use tuner::{LocalTunerHost, TUNER_TYPE, TunerHost, VirtualTuner};
