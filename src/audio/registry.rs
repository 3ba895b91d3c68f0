use dashmap::{mapref::entry::Entry, DashMap};
use serenity::model::id::GuildId;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{engine::EngineFactory, session::PlaybackSession, sink::VoiceSinkBinder};
use crate::presence::PresenceUpdater;

/// Guild id a sesión de reproducción, creada en el primer uso.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<PlaybackSession>>,
    engines: Arc<dyn EngineFactory>,
    presence: Arc<dyn PresenceUpdater>,
    sinks: Arc<dyn VoiceSinkBinder>,
    frame_capacity: usize,
}

impl SessionRegistry {
    pub fn new(
        engines: Arc<dyn EngineFactory>,
        presence: Arc<dyn PresenceUpdater>,
        sinks: Arc<dyn VoiceSinkBinder>,
        frame_capacity: usize,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            engines,
            presence,
            sinks,
            frame_capacity,
        }
    }

    /// Obtiene la sesión del guild; la crea y enlaza su sink de audio en el
    /// primer acceso. Cada llamada cuenta como actividad y reinicia el reloj
    /// de inactividad.
    ///
    /// La construcción ocurre bajo el lock de la entrada del mapa, así que
    /// llamadas concurrentes crean y enlazan una sola vez.
    ///
    /// # Panics
    ///
    /// Si el binder ya tiene un sink para el guild, es decir, algo fuera de
    /// este registro lo enlazó.
    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<PlaybackSession> {
        if let Some(session) = self.get(guild_id) {
            session.scheduler().touch();
            return session;
        }

        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                let engine = self.engines.create_engine(guild_id);
                let session = Arc::new(PlaybackSession::new(
                    guild_id,
                    engine,
                    self.presence.clone(),
                    self.frame_capacity,
                ));
                if let Err(e) = self.sinks.bind(guild_id, session.sink()) {
                    panic!("session registry invariant broken: {e}");
                }
                info!("🎧 Sesión de reproducción creada para guild {}", guild_id);
                session
            })
            .value()
            .clone()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions.get(&guild_id).map(|s| Arc::clone(s.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Elimina las sesiones sin nada que reproducir durante al menos `max_idle`
    /// que nadie fuera del registro tiene (un comando o una resolución en
    /// curso) y libera sus sinks de audio. Devuelve cuántas eliminó.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let candidates: Vec<GuildId> = self
            .sessions
            .iter()
            .filter(|s| is_expired(s.value(), now, max_idle))
            .map(|s| *s.key())
            .collect();

        let mut evicted = 0;
        for guild_id in candidates {
            // revalidar bajo el lock de la entrada; la sesión pudo reactivarse
            if let Entry::Occupied(entry) = self.sessions.entry(guild_id) {
                if is_expired(entry.get(), now, max_idle) && !is_in_use(entry.get()) {
                    self.sinks.unbind(guild_id);
                    entry.remove();
                    evicted += 1;
                    debug!("Sesión inactiva eliminada para guild {}", guild_id);
                }
            }
        }

        if evicted > 0 {
            info!("🧹 Eliminadas {} sesiones inactivas", evicted);
        }
        evicted
    }

    /// Ejecuta [`evict_idle`](Self::evict_idle) cada `every` hasta que se cancele `cancel`.
    pub fn spawn_idle_reaper(
        self: &Arc<Self>,
        every: Duration,
        max_idle: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = timer.tick() => {
                        registry.evict_idle(max_idle);
                    }
                }
            }
            debug!("Limpieza de sesiones detenida");
        })
    }
}

fn is_expired(session: &PlaybackSession, now: Instant, max_idle: Duration) -> bool {
    session
        .scheduler()
        .idle_for(now)
        .is_some_and(|idle| idle >= max_idle)
}

/// Alguien fuera del mapa todavía tiene la sesión o su scheduler.
///
/// Solo es fiable bajo el lock de la entrada: mientras se mantiene, `get` no
/// puede sacar otra referencia del mapa.
fn is_in_use(session: &Arc<PlaybackSession>) -> bool {
    Arc::strong_count(session) > 1 || Arc::strong_count(session.scheduler()) > 1
}
