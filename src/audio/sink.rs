use dashmap::{mapref::entry::Entry, DashMap};
use serenity::model::id::GuildId;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::bridge::AudioSendHandler;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("guild {0} already has an audio sink")]
    AlreadyBound(GuildId),
}

/// Conecta la fuente de frames de una sesión con la conexión de voz del guild.
pub trait VoiceSinkBinder: Send + Sync {
    /// Instala `handler` como única fuente de audio de `guild_id`.
    fn bind(&self, guild_id: GuildId, handler: Arc<dyn AudioSendHandler>) -> Result<(), BindError>;

    fn unbind(&self, guild_id: GuildId) -> Option<Arc<dyn AudioSendHandler>>;
}

/// Tabla de sinks por guild de la que el transporte de voz lee frames.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: DashMap<GuildId, Arc<dyn AudioSendHandler>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self, guild_id: GuildId) -> Option<Arc<dyn AudioSendHandler>> {
        self.sinks.get(&guild_id).map(|sink| Arc::clone(sink.value()))
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl VoiceSinkBinder for SinkRegistry {
    fn bind(&self, guild_id: GuildId, handler: Arc<dyn AudioSendHandler>) -> Result<(), BindError> {
        match self.sinks.entry(guild_id) {
            Entry::Occupied(_) => Err(BindError::AlreadyBound(guild_id)),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                info!("🔊 Sink de audio enlazado para guild {}", guild_id);
                Ok(())
            }
        }
    }

    fn unbind(&self, guild_id: GuildId) -> Option<Arc<dyn AudioSendHandler>> {
        let removed = self.sinks.remove(&guild_id).map(|(_, sink)| sink);
        if removed.is_some() {
            debug!("Sink de audio liberado para guild {}", guild_id);
        }
        removed
    }
}
