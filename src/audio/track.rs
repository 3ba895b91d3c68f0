use serde::{Deserialize, Serialize};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

fn next_instance() -> u64 {
    NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)
}

/// Metadatos que informa el backend para un track reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub title: String,
    pub author: String,
    /// Duración en milisegundos. Los streams informan cero o cualquier valor.
    pub length: u64,
    pub is_stream: bool,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Referencia opaca y reproducible que produce el backend.
///
/// Clonar mantiene la misma instancia; [`Track::fresh_copy`] crea una nueva
/// para distinguir un track reiniciado del que acaba de terminar.
#[derive(Debug, Clone)]
pub struct Track {
    encoded: String,
    info: TrackInfo,
    instance: u64,
}

impl Track {
    pub fn new(encoded: impl Into<String>, info: TrackInfo) -> Self {
        Self {
            encoded: encoded.into(),
            info,
            instance: next_instance(),
        }
    }

    /// Handle del backend que usa el motor para cargar el audio.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.info.length)
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn is_same_instance(&self, other: &Track) -> bool {
        self.instance == other.instance
    }

    /// Mismo audio, nueva instancia de reproducción.
    pub fn fresh_copy(&self) -> Self {
        Self {
            encoded: self.encoded.clone(),
            info: self.info.clone(),
            instance: next_instance(),
        }
    }
}

/// Por qué el motor dejó de reproducir un track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// El track sonó hasta el final.
    Finished,
    /// El motor no pudo cargar o decodificar el track.
    LoadFailed,
    /// Se detuvo explícitamente.
    Stopped,
    /// Otro track empezó en su lugar.
    Replaced,
    /// El motor soltó el track al cerrarse.
    Cleanup,
}

impl EndReason {
    /// Solo los finales naturales dejan que el scheduler avance solo.
    pub fn may_start_next(self) -> bool {
        matches!(self, EndReason::Finished | EndReason::LoadFailed)
    }
}
