use bytes::Bytes;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::bridge::AudioSendHandler;

/// Un frame opus de audio.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(20);

/// Consulta `handler` una vez por [`FRAME_INTERVAL`] y reenvía los frames a `out`.
///
/// Para transportes que reciben frames por un canal en vez de usar su propio
/// reloj. Con el canal lleno el frame se descarta; un canal cerrado o `cancel`
/// terminan la tarea, que devuelve cuántos frames reenvió.
pub fn spawn_frame_clock(
    handler: Arc<dyn AudioSendHandler>,
    out: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sent = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !handler.can_provide() {
                        continue;
                    }
                    let Some(frame) = handler.provide_frame() else {
                        continue;
                    };
                    match out.try_send(frame) {
                        Ok(()) => sent += 1,
                        Err(TrySendError::Full(_)) => trace!("Transporte atrasado, frame descartado"),
                        Err(TrySendError::Closed(_)) => break,
                    }
                }
            }
        }

        debug!("Reloj de frames detenido tras {} frames", sent);
        sent
    })
}
