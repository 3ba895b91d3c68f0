//! Bot status updates driven by playback.

use serenity::gateway::{ActivityData, ShardMessenger};
use tracing::debug;

/// Notificaciones de "reproduciendo ahora" sin respuesta.
#[cfg_attr(test, mockall::automock)]
pub trait PresenceUpdater: Send + Sync {
    fn set_now_playing(&self, title: &str);
    fn set_idle(&self);
}

/// Muestra el track actual como actividad "Escuchando" en un shard del gateway.
#[derive(Clone)]
pub struct DiscordPresence {
    shard: ShardMessenger,
}

impl DiscordPresence {
    pub fn new(shard: ShardMessenger) -> Self {
        Self { shard }
    }
}

impl PresenceUpdater for DiscordPresence {
    fn set_now_playing(&self, title: &str) {
        debug!("Presencia: escuchando {}", title);
        self.shard.set_activity(Some(ActivityData::listening(title)));
    }

    fn set_idle(&self) {
        debug!("Presencia: inactivo");
        self.shard.set_activity(None);
    }
}

/// Descarta todas las actualizaciones.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPresence;

impl PresenceUpdater for NoPresence {
    fn set_now_playing(&self, _title: &str) {}

    fn set_idle(&self) {}
}
