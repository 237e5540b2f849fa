//! Typed guide errors callers can match on.

/// Guide operation failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuideError {
    /// No scheduled program covers the current time on the channel.
    NoProgramAiring {
        /// Channel that was queried.
        channel_id: String,
    },
}

impl std::fmt::Display for GuideError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoProgramAiring { channel_id } => {
                write!(f, "no program is airing on channel {channel_id}")
            }
        }
    }
}

impl std::error::Error for GuideError {}
