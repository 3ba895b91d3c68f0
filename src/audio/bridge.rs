use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

use super::engine::PlayerEngine;

/// Espacio para un paquete opus de 20ms a 510kbps, con margen.
pub const DEFAULT_FRAME_CAPACITY: usize = 1536;

/// Interfaz que el transporte de voz consulta una vez cada 20ms.
pub trait AudioSendHandler: Send + Sync {
    /// Prepara el siguiente frame. Devuelve `false` si no hay nada que enviar.
    fn can_provide(&self) -> bool;

    /// Entrega el frame preparado por el último `can_provide` exitoso.
    fn provide_frame(&self) -> Option<Bytes>;

    fn is_opus(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Writable,
    Readable,
}

#[derive(Debug)]
struct FrameSlot {
    buf: BytesMut,
    phase: Phase,
}

/// Adapta la lectura de frames del motor al ciclo llenar-leer del transporte.
///
/// `can_provide` llena el slot y `provide_frame` lo congela en [`Bytes`]. Un
/// frame que el transporte todavía tiene nunca se sobrescribe: el siguiente
/// llenado solo reutiliza la memoria cuando se soltaron todos los frames
/// entregados.
pub struct FrameSendBridge {
    engine: Arc<dyn PlayerEngine>,
    capacity: usize,
    slot: Mutex<FrameSlot>,
}

impl FrameSendBridge {
    pub fn new(engine: Arc<dyn PlayerEngine>, capacity: usize) -> Self {
        Self {
            engine,
            capacity,
            slot: Mutex::new(FrameSlot {
                buf: BytesMut::with_capacity(capacity),
                phase: Phase::Writable,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl AudioSendHandler for FrameSendBridge {
    fn can_provide(&self) -> bool {
        let mut slot = self.slot.lock();
        if slot.phase == Phase::Readable {
            trace!("Descartando un frame que el transporte no leyó");
        }

        // volver a modo escritura
        slot.buf.clear();
        slot.buf.reserve(self.capacity);
        slot.buf.resize(self.capacity, 0);

        match self.engine.provide(&mut slot.buf[..]) {
            Some(len) if len > 0 => {
                slot.buf.truncate(len.min(self.capacity));
                slot.phase = Phase::Readable;
                true
            }
            _ => {
                slot.buf.clear();
                slot.phase = Phase::Writable;
                false
            }
        }
    }

    fn provide_frame(&self) -> Option<Bytes> {
        let mut slot = self.slot.lock();
        if slot.phase != Phase::Readable {
            return None;
        }

        slot.phase = Phase::Writable;
        Some(slot.buf.split().freeze())
    }

    fn is_opus(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{engine::TrackEventListener, track::Track};
    use std::{collections::VecDeque, sync::Weak};

    #[derive(Default)]
    struct ScriptedEngine {
        frames: Mutex<VecDeque<Vec<u8>>>,
    }

    impl ScriptedEngine {
        fn with_frames(frames: &[&[u8]]) -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(frames.iter().map(|f| f.to_vec()).collect()),
            })
        }
    }

    impl PlayerEngine for ScriptedEngine {
        fn play(&self, _track: Track) {}

        fn stop(&self) {}

        fn provide(&self, frame: &mut [u8]) -> Option<usize> {
            let next = self.frames.lock().pop_front()?;
            let len = next.len().min(frame.len());
            frame[..len].copy_from_slice(&next[..len]);
            Some(len)
        }

        fn set_listener(&self, _listener: Weak<dyn TrackEventListener>) {}
    }

    #[test]
    fn test_fill_then_read_cycle() {
        let bridge = FrameSendBridge::new(ScriptedEngine::with_frames(&[b"abc", b"defg"]), 16);

        assert!(bridge.can_provide());
        assert_eq!(bridge.provide_frame().unwrap(), Bytes::from_static(b"abc"));
        assert!(bridge.can_provide());
        assert_eq!(bridge.provide_frame().unwrap(), Bytes::from_static(b"defg"));
        assert!(!bridge.can_provide());
        assert!(bridge.provide_frame().is_none());
    }

    #[test]
    fn test_frame_requires_successful_fill() {
        let bridge = FrameSendBridge::new(ScriptedEngine::with_frames(&[b"abc"]), 16);

        assert!(bridge.provide_frame().is_none());
        assert!(bridge.can_provide());
        assert!(bridge.provide_frame().is_some());
        // ya entregado
        assert!(bridge.provide_frame().is_none());
    }

    #[test]
    fn test_held_frame_survives_next_fill() {
        let bridge = FrameSendBridge::new(ScriptedEngine::with_frames(&[b"first", b"second"]), 16);

        assert!(bridge.can_provide());
        let held = bridge.provide_frame().unwrap();
        assert!(bridge.can_provide());
        let next = bridge.provide_frame().unwrap();

        assert_eq!(held, Bytes::from_static(b"first"));
        assert_eq!(next, Bytes::from_static(b"second"));
    }

    #[test]
    fn test_unread_frame_is_replaced() {
        let bridge = FrameSendBridge::new(ScriptedEngine::with_frames(&[b"stale", b"fresh"]), 16);

        assert!(bridge.can_provide());
        assert!(bridge.can_provide());
        assert_eq!(bridge.provide_frame().unwrap(), Bytes::from_static(b"fresh"));
    }

    #[test]
    fn test_always_opus() {
        let bridge = FrameSendBridge::new(ScriptedEngine::with_frames(&[]), DEFAULT_FRAME_CAPACITY);
        assert!(bridge.is_opus());
        assert_eq!(bridge.capacity(), DEFAULT_FRAME_CAPACITY);
    }
}
