use serenity::model::id::{GuildId, UserId};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{
    engine::EngineFactory,
    queue::TrackSummary,
    registry::SessionRegistry,
    session::PlaybackSession,
    sink::VoiceSinkBinder,
};
use crate::{
    config::Config,
    presence::PresenceUpdater,
    sources::{LavalinkResolver, ResolveError, Resolved, TrackResolutionClient},
};

/// Punto de entrada para los comandos: sesiones, cola y control de reproducción.
pub struct AudioPlayer {
    registry: Arc<SessionRegistry>,
    resolver: TrackResolutionClient,
    idle_timeout: Duration,
    reaper_interval: Duration,
}

impl AudioPlayer {
    pub fn new(registry: Arc<SessionRegistry>, resolver: TrackResolutionClient) -> Self {
        let defaults = Config::default();
        Self {
            registry,
            resolver,
            idle_timeout: defaults.session_idle_timeout,
            reaper_interval: defaults.reaper_interval,
        }
    }

    /// Crea un player que resuelve con el nodo Lavalink configurado.
    pub fn from_config(
        config: &Config,
        engines: Arc<dyn EngineFactory>,
        presence: Arc<dyn PresenceUpdater>,
        sinks: Arc<dyn VoiceSinkBinder>,
    ) -> Self {
        info!("⚙️ {}", config.summary());

        let registry = Arc::new(SessionRegistry::new(
            engines,
            presence,
            sinks,
            config.frame_capacity,
        ));
        let backend = LavalinkResolver::new(&config.lavalink_url, config.lavalink_password.clone());
        let resolver = TrackResolutionClient::new(
            Arc::new(backend),
            config.resolve_timeout,
            config.search_prefix.clone(),
        );

        Self::new(registry, resolver).with_idle_eviction(config.session_idle_timeout, config.reaper_interval)
    }

    pub fn with_idle_eviction(mut self, idle_timeout: Duration, reaper_interval: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self.reaper_interval = reaper_interval;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn get_or_create_session(&self, guild_id: GuildId) -> Arc<PlaybackSession> {
        self.registry.get_or_create(guild_id)
    }

    pub fn session(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.registry.get(guild_id)
    }

    /// Resuelve `query` en segundo plano y encola lo que encuentre.
    pub fn enqueue_from_query(
        &self,
        session: &PlaybackSession,
        query: &str,
        requester: UserId,
    ) -> JoinHandle<Result<Resolved, ResolveError>> {
        self.resolver
            .resolve(query, session.scheduler().clone(), requester)
    }

    pub fn skip(&self, session: &PlaybackSession) {
        session.skip();
    }

    pub fn set_loop(&self, session: &PlaybackSession, enabled: bool) {
        session.set_loop(enabled);
    }

    pub fn clear(&self, session: &PlaybackSession) {
        session.clear();
    }

    pub fn queue_snapshot(&self, session: &PlaybackSession) -> Vec<TrackSummary> {
        session.queue_snapshot()
    }

    pub fn current_track(&self, session: &PlaybackSession) -> Option<TrackSummary> {
        session.current_track()
    }

    pub fn evict_idle(&self) -> usize {
        self.registry.evict_idle(self.idle_timeout)
    }

    pub fn spawn_idle_reaper(&self, cancel: CancellationToken) -> JoinHandle<()> {
        self.registry
            .spawn_idle_reaper(self.reaper_interval, self.idle_timeout, cancel)
    }
}
