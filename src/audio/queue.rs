use chrono::{DateTime, Utc};
use serenity::model::id::UserId;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::{debug, info};

use super::track::Track;

/// Un track junto con quien lo pidió.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub track: Track,
    pub requested_by: UserId,
    pub added_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(track: Track, requested_by: UserId) -> Self {
        Self {
            track,
            requested_by,
            added_at: Utc::now(),
        }
    }

    /// La misma entrada con una instancia nueva del track.
    fn restarted(&self) -> Self {
        Self {
            track: self.track.fresh_copy(),
            requested_by: self.requested_by,
            added_at: self.added_at,
        }
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            title: self.track.title().to_string(),
            duration_ms: self.track.info().length,
            requested_by: self.requested_by,
        }
    }
}

/// Vista de una entrada lista para mostrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    pub title: String,
    pub duration_ms: u64,
    pub requested_by: UserId,
}

/// Lo que un cambio de estado le pide al motor.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Un track nuevo pasó a sonar.
    Started(QueueEntry),
    /// El track terminado vuelve a empezar por el loop.
    Looped(QueueEntry),
    /// No queda nada por reproducir.
    Drained,
}

/// Copia puntual de la cola de un scheduler.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub current: Option<TrackSummary>,
    pub pending: Vec<TrackSummary>,
    pub loop_enabled: bool,
    pub total_duration: Duration,
}

/// Track actual, cola FIFO y flag de loop de una sesión.
///
/// Estado puro: quien llama aplica la [`Transition`] devuelta al motor.
#[derive(Debug)]
pub struct SchedulerState {
    current: Option<QueueEntry>,
    pending: VecDeque<QueueEntry>,
    loop_enabled: bool,
    idle_since: Option<Instant>,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerState {
    pub fn new() -> Self {
        Self {
            current: None,
            pending: VecDeque::new(),
            loop_enabled: false,
            idle_since: Some(Instant::now()),
        }
    }

    pub fn is_idle(&self) -> bool {
        debug_assert!(self.current.is_some() || self.pending.is_empty());
        self.current.is_none()
    }

    /// Empieza `entry` de inmediato si está inactivo, si no lo agrega al final.
    pub fn enqueue(&mut self, entry: QueueEntry) -> Option<Transition> {
        if self.current.is_none() {
            info!("▶️ Reproduciendo de inmediato: {}", entry.track.title());
            self.set_current(entry.clone());
            return Some(Transition::Started(entry));
        }

        info!("➕ Agregado a la cola: {}", entry.track.title());
        self.pending.push_back(entry);
        None
    }

    /// Avanza cuando el track actual terminó solo.
    ///
    /// Con loop activo el track terminado vuelve a empezar, antes que la cola.
    /// Devuelve `None` si no sonaba nada.
    pub fn advance(&mut self) -> Option<Transition> {
        let finished = self.current.take()?;

        if self.loop_enabled {
            let again = finished.restarted();
            info!("🔂 Repitiendo track: {}", again.track.title());
            self.current = Some(again.clone());
            return Some(Transition::Looped(again));
        }

        Some(self.pop_next())
    }

    /// Salta el track actual, ignorando el loop.
    pub fn skip(&mut self) -> Option<Transition> {
        let skipped = self.current.take()?;
        debug!("⏭️ Saltando: {}", skipped.track.title());
        Some(self.pop_next())
    }

    /// Limpia la cola y el track actual.
    pub fn clear(&mut self) -> Option<Transition> {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            info!("🗑️ Cola limpiada ({} tracks)", dropped);
        }

        self.current.take()?;
        self.go_idle();
        Some(Transition::Drained)
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
        if enabled {
            info!("🔂 Repetir canción activado");
        } else {
            info!("➡️ Repetición desactivada");
        }
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> impl Iterator<Item = &QueueEntry> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cuánto tiempo lleva la sesión sin nada que reproducir, a `now`.
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        self.idle_since
            .map(|since| now.saturating_duration_since(since))
    }

    /// Reinicia el reloj de inactividad si no suena nada.
    pub fn touch(&mut self) {
        if self.current.is_none() {
            self.idle_since = Some(Instant::now());
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let pending: Vec<TrackSummary> = self.pending.iter().map(QueueEntry::summary).collect();
        let total_duration = self
            .current
            .iter()
            .chain(self.pending.iter())
            .map(|entry| entry.track.duration())
            .sum();

        QueueSnapshot {
            current: self.current.as_ref().map(QueueEntry::summary),
            pending,
            loop_enabled: self.loop_enabled,
            total_duration,
        }
    }

    fn pop_next(&mut self) -> Transition {
        match self.pending.pop_front() {
            Some(next) => {
                info!("➡️ Siguiente en cola (FIFO): {}", next.track.title());
                self.set_current(next.clone());
                Transition::Started(next)
            }
            None => {
                info!("📭 Cola vacía, no hay siguiente track");
                self.go_idle();
                Transition::Drained
            }
        }
    }

    fn set_current(&mut self, entry: QueueEntry) {
        self.current = Some(entry);
        self.idle_since = None;
    }

    fn go_idle(&mut self) {
        self.current = None;
        self.idle_since = Some(Instant::now());
    }
}
