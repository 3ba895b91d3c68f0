use parking_lot::Mutex;
use serenity::model::id::GuildId;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

use super::{
    engine::{PlayerEngine, TrackEventListener},
    queue::{QueueEntry, QueueSnapshot, SchedulerState, TrackSummary, Transition},
    track::{EndReason, Track},
};
use crate::presence::PresenceUpdater;

/// Maneja el motor de una sesión a partir de su cola.
///
/// Cada operación toma el lock de estado una vez y emite el comando al motor
/// y la actualización de presencia antes de soltarlo, así el motor recibe los
/// comandos en el mismo orden que los cambios de estado.
pub struct TrackScheduler {
    guild_id: GuildId,
    state: Mutex<SchedulerState>,
    engine: Arc<dyn PlayerEngine>,
    presence: Arc<dyn PresenceUpdater>,
}

impl TrackScheduler {
    pub fn new(
        guild_id: GuildId,
        engine: Arc<dyn PlayerEngine>,
        presence: Arc<dyn PresenceUpdater>,
    ) -> Self {
        Self {
            guild_id,
            state: Mutex::new(SchedulerState::new()),
            engine,
            presence,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Reproduce `entry` ya si está inactivo, si no lo encola.
    pub fn enqueue(&self, entry: QueueEntry) {
        let mut state = self.state.lock();
        if let Some(transition) = state.enqueue(entry) {
            self.apply(&state, transition, false);
        }
    }

    /// Igual que [`enqueue`](Self::enqueue) para cada entrada en orden, pero
    /// nadie más puede colar una entrada en medio (playlists).
    pub fn enqueue_all<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = QueueEntry>,
    {
        let mut state = self.state.lock();
        let mut count = 0;
        for entry in entries {
            if let Some(transition) = state.enqueue(entry) {
                self.apply(&state, transition, false);
            }
            count += 1;
        }
        count
    }

    /// Reacciona al fin natural del track actual.
    pub fn advance(&self) {
        let mut state = self.state.lock();
        self.advance_locked(&mut state);
    }

    /// Detiene el track actual y pasa al siguiente. Sin efecto si está inactivo.
    pub fn skip(&self) {
        let mut state = self.state.lock();
        match state.skip() {
            Some(transition) => self.apply(&state, transition, true),
            None => debug!("Skip ignorado en guild {}: no suena nada", self.guild_id),
        }
    }

    /// Limpia la cola y detiene la reproducción.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if let Some(transition) = state.clear() {
            self.apply(&state, transition, true);
        }
    }

    /// Aplica en el próximo fin natural de track.
    pub fn set_loop(&self, enabled: bool) {
        self.state.lock().set_loop(enabled);
    }

    pub fn is_loop_enabled(&self) -> bool {
        self.state.lock().loop_enabled()
    }

    pub fn is_idle(&self) -> bool {
        self.state.lock().is_idle()
    }

    /// Reinicia el reloj de inactividad (la sesión sigue en uso).
    pub fn touch(&self) {
        self.state.lock().touch();
    }

    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        self.state.lock().idle_for(now)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.state.lock().snapshot()
    }

    pub fn current_track(&self) -> Option<TrackSummary> {
        self.state.lock().current().map(QueueEntry::summary)
    }

    /// La cola pendiente, sin el track actual.
    pub fn queue(&self) -> Vec<TrackSummary> {
        self.state.lock().pending().map(QueueEntry::summary).collect()
    }

    fn advance_locked(&self, state: &mut SchedulerState) {
        match state.advance() {
            Some(transition) => self.apply(state, transition, false),
            None => debug!("Avance ignorado en guild {}: ya inactivo", self.guild_id),
        }
    }

    fn apply(&self, state: &SchedulerState, transition: Transition, interrupt: bool) {
        match transition {
            Transition::Started(entry) => {
                self.engine.play(entry.track.clone());
                // con loop la presencia se mantiene como continuación
                if !state.loop_enabled() {
                    self.presence.set_now_playing(entry.track.title());
                }
            }
            Transition::Looped(entry) => {
                self.engine.play(entry.track);
            }
            Transition::Drained => {
                if interrupt {
                    self.engine.stop();
                }
                self.presence.set_idle();
            }
        }
    }
}

impl TrackEventListener for TrackScheduler {
    fn on_track_start(&self, track: &Track) {
        let state = self.state.lock();
        match state.current() {
            Some(current) if current.track.is_same_instance(track) => {
                info!("🎵 Reproduciendo en guild {}: {}", self.guild_id, track.title());
            }
            _ => warn!(
                "El motor de guild {} inició {}, que no es el track programado",
                self.guild_id,
                track.title()
            ),
        }
    }

    fn on_track_end(&self, track: &Track, reason: EndReason) {
        if !reason.may_start_next() {
            debug!("Track {} terminado ({:?}), sin avanzar", track.title(), reason);
            return;
        }

        let mut state = self.state.lock();
        let is_current = state
            .current()
            .is_some_and(|current| current.track.is_same_instance(track));
        if !is_current {
            debug!("Evento de fin obsoleto para {} en guild {}", track.title(), self.guild_id);
            return;
        }

        if reason == EndReason::LoadFailed {
            warn!("❌ No se pudo cargar {}, pasando al siguiente", track.title());
        }
        self.advance_locked(&mut state);
    }
}
