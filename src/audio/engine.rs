use serenity::model::id::GuildId;
use std::sync::{Arc, Weak};

use super::track::{EndReason, Track};

/// Recibe eventos de reproducción de un [`PlayerEngine`].
pub trait TrackEventListener: Send + Sync {
    fn on_track_start(&self, track: &Track);
    fn on_track_end(&self, track: &Track, reason: EndReason);
}

/// El reproductor externo que decodifica tracks y produce frames codificados.
///
/// Los motores llaman al listener desde su propio contexto (un hilo de
/// decodificación, la lectura de frames) y nunca desde `play` o `stop`, que se
/// llaman con el lock del scheduler tomado.
pub trait PlayerEngine: Send + Sync {
    /// Inicia `track` reemplazando lo que sonaba. El track reemplazado termina
    /// con [`EndReason::Replaced`].
    fn play(&self, track: Track);

    /// Detiene la reproducción. El track actual termina con [`EndReason::Stopped`].
    fn stop(&self);

    /// Escribe el siguiente paquete opus de 20ms en `frame` y devuelve su largo,
    /// o `None` si no hay nada que enviar.
    fn provide(&self, frame: &mut [u8]) -> Option<usize>;

    fn set_listener(&self, listener: Weak<dyn TrackEventListener>);
}

/// Crea un motor por sesión de reproducción.
pub trait EngineFactory: Send + Sync {
    fn create_engine(&self, guild_id: GuildId) -> Arc<dyn PlayerEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn(GuildId) -> Arc<dyn PlayerEngine> + Send + Sync,
{
    fn create_engine(&self, guild_id: GuildId) -> Arc<dyn PlayerEngine> {
        self(guild_id)
    }
}
