use serenity::model::id::GuildId;
use std::sync::Arc;

use super::{
    bridge::{AudioSendHandler, FrameSendBridge},
    engine::{PlayerEngine, TrackEventListener},
    queue::{QueueSnapshot, TrackSummary},
    scheduler::TrackScheduler,
};
use crate::presence::PresenceUpdater;

/// Motor, scheduler y bridge de frames de un guild.
pub struct PlaybackSession {
    guild_id: GuildId,
    engine: Arc<dyn PlayerEngine>,
    scheduler: Arc<TrackScheduler>,
    bridge: Arc<FrameSendBridge>,
}

impl PlaybackSession {
    /// Arma una sesión nueva y registra su scheduler como listener del motor.
    pub fn new(
        guild_id: GuildId,
        engine: Arc<dyn PlayerEngine>,
        presence: Arc<dyn PresenceUpdater>,
        frame_capacity: usize,
    ) -> Self {
        let scheduler = Arc::new(TrackScheduler::new(guild_id, engine.clone(), presence));
        let listener: Arc<dyn TrackEventListener> = scheduler.clone();
        engine.set_listener(Arc::downgrade(&listener));

        let bridge = Arc::new(FrameSendBridge::new(engine.clone(), frame_capacity));

        Self {
            guild_id,
            engine,
            scheduler,
            bridge,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn engine(&self) -> &Arc<dyn PlayerEngine> {
        &self.engine
    }

    pub fn scheduler(&self) -> &Arc<TrackScheduler> {
        &self.scheduler
    }

    /// La fuente de frames para el transporte de voz.
    pub fn sink(&self) -> Arc<dyn AudioSendHandler> {
        self.bridge.clone()
    }

    pub fn skip(&self) {
        self.scheduler.skip();
    }

    pub fn set_loop(&self, enabled: bool) {
        self.scheduler.set_loop(enabled);
    }

    pub fn clear(&self) {
        self.scheduler.clear();
    }

    pub fn queue_snapshot(&self) -> Vec<TrackSummary> {
        self.scheduler.queue()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.scheduler.snapshot()
    }

    pub fn current_track(&self) -> Option<TrackSummary> {
        self.scheduler.current_track()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }
}
