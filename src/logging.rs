use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Inicializar logging. `RUST_LOG` tiene prioridad sobre los valores por defecto.
///
/// Se puede llamar más de una vez; solo la primera instala el subscriber.
pub fn init() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn").add_directive("guild_playback=debug".parse()?),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    Ok(())
}
