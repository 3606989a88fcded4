use crate::channel::ChannelGroup;
use crate::train::TrainingState;

/// A fatal condition on one channel block.
///
/// None of these are retried: a channel that does not respond to clears or
/// reports RX errors at the bring-up rate is physically broken.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("{channel}: clear request {mask:#06x} still pending after {waited_us} us")]
    ClearTimeout {
        channel: ChannelGroup,
        mask: u32,
        waited_us: u32,
    },
    #[error("{channel}: RX errors latched (status {status:#010x})")]
    Errored { channel: ChannelGroup, status: u32 },
    #[error("{channel}: link not suspended after {waited_us} us")]
    SuspendTimeout { channel: ChannelGroup, waited_us: u32 },
}

impl LinkError {
    /// The channel block that failed.
    #[must_use]
    pub const fn channel(&self) -> ChannelGroup {
        match self {
            Self::ClearTimeout { channel, .. }
            | Self::Errored { channel, .. }
            | Self::SuspendTimeout { channel, .. } => *channel,
        }
    }
}

/// Training aborted; names the phase that was running.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("SLI training aborted during {phase}: {source}")]
pub struct TrainError {
    pub phase: TrainingState,
    #[source]
    pub source: LinkError,
}
