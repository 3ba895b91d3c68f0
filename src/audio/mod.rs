//! # Audio Module
//!
//! Per-guild playback sessions for the bot.
//!
//! ## Architecture
//!
//! Each guild gets one [`session::PlaybackSession`], created on first use by the
//! [`registry::SessionRegistry`]. A session ties together:
//!
//! ### [`scheduler`] - Track Scheduler
//! - Owns the now-playing slot, the FIFO backlog and the loop flag
//! - Tells the engine what to play and keeps the bot status in sync
//! - Advances on natural track ends reported by the engine
//!
//! ### [`bridge`] - Frame Send Bridge
//! - Pulls one encoded frame per 20ms tick from the engine
//! - Hands frames to the voice transport as immutable [`bytes::Bytes`]
//!
//! ### [`engine`] - Player Engine seam
//! - The external decoder/encoder; this crate never touches audio payloads
//!
//! ## Concurrency
//!
//! Command handlers, background resolutions and the frame pull all touch a
//! session at once. Scheduler state sits behind one mutex per session; the
//! frame slot behind another. Nothing is shared between guilds.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use guild_playback::audio::player::AudioPlayer;
//! use serenity::model::id::{GuildId, UserId};
//!
//! # async fn example(player: AudioPlayer) -> anyhow::Result<()> {
//! let session = player.get_or_create_session(GuildId::new(123456789));
//!
//! let queued = player
//!     .enqueue_from_query(&session, "never gonna give you up", UserId::new(1))
//!     .await??;
//! println!("{queued:?}");
//!
//! player.set_loop(&session, true);
//! player.skip(&session);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cadence;
pub mod engine;
pub mod player;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod sink;
pub mod track;
