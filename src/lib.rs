//! # guild-playback
//!
//! Voice playback sessions for a Discord music bot: one queue, one player
//! engine and one frame bridge per guild, plus the background pipeline that
//! turns user queries into queued tracks.
//!
//! The command layer, message formatting and the voice transport live
//! elsewhere and talk to this crate through [`audio::player::AudioPlayer`].

pub mod audio;
pub mod config;
pub mod logging;
pub mod presence;
pub mod sources;

pub use audio::{
    bridge::{AudioSendHandler, FrameSendBridge},
    engine::{EngineFactory, PlayerEngine, TrackEventListener},
    player::AudioPlayer,
    queue::{QueueEntry, QueueSnapshot, TrackSummary},
    registry::SessionRegistry,
    scheduler::TrackScheduler,
    session::PlaybackSession,
    sink::{BindError, SinkRegistry, VoiceSinkBinder},
    track::{EndReason, Track, TrackInfo},
};
pub use config::Config;
pub use presence::{DiscordPresence, NoPresence, PresenceUpdater};
pub use sources::{LoadError, LoadResult, MediaResolver, ResolveError, Resolved, TrackResolutionClient};
