//! Fakes for the collaborators the playback core talks to.

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use guild_playback::{
    audio::track::{EndReason, Track, TrackInfo},
    AudioPlayer, EngineFactory, LoadError, LoadResult, MediaResolver, PlayerEngine,
    PresenceUpdater, SessionRegistry, SinkRegistry, TrackEventListener, TrackResolutionClient,
};
use parking_lot::Mutex;
use serenity::model::id::GuildId;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

/// Silencio opus.
pub const SILENCE: [u8; 3] = [0xF8, 0xFF, 0xFE];

pub fn init_logging() {
    guild_playback::logging::init().expect("logging");
}

pub fn track(title: &str) -> Track {
    Track::new(
        format!("enc:{title}"),
        TrackInfo {
            identifier: title.to_string(),
            title: title.to_string(),
            author: "Test Artist".to_string(),
            length: 180_000,
            is_stream: false,
            uri: Some(format!("https://example.com/{title}")),
        },
    )
}

/// Reproduce lo que le piden y termina tracks cuando el test lo indica.
#[derive(Default)]
pub struct FakeEngine {
    now: Mutex<Option<Track>>,
    played: Mutex<Vec<Track>>,
    stops: AtomicUsize,
    listener: Mutex<Option<Weak<dyn TrackEventListener>>>,
}

impl FakeEngine {
    pub fn playing(&self) -> Option<Track> {
        self.now.lock().clone()
    }

    pub fn played_titles(&self) -> Vec<String> {
        self.played.lock().iter().map(|t| t.title().to_string()).collect()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Avisa al listener que el track actual empezó a sonar, como lo haría el
    /// hilo de decodificación después de `play`.
    pub fn begin(&self) {
        let started = self.now.lock().clone();
        let listener = self.listener.lock().as_ref().and_then(Weak::upgrade);
        if let (Some(track), Some(listener)) = (started, listener) {
            listener.on_track_start(&track);
        }
    }

    /// El track actual suena hasta el final.
    pub fn finish(&self) {
        self.end_current(EndReason::Finished);
    }

    pub fn end_current(&self, reason: EndReason) {
        let ended = self.now.lock().take();
        let listener = self.listener.lock().as_ref().and_then(Weak::upgrade);
        if let (Some(track), Some(listener)) = (ended, listener) {
            listener.on_track_end(&track, reason);
        }
    }
}

impl PlayerEngine for FakeEngine {
    fn play(&self, track: Track) {
        *self.now.lock() = Some(track.clone());
        self.played.lock().push(track);
    }

    fn stop(&self) {
        *self.now.lock() = None;
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn provide(&self, frame: &mut [u8]) -> Option<usize> {
        self.now.lock().as_ref()?;
        frame[..SILENCE.len()].copy_from_slice(&SILENCE);
        Some(SILENCE.len())
    }

    fn set_listener(&self, listener: Weak<dyn TrackEventListener>) {
        *self.listener.lock() = Some(listener);
    }
}

/// Entrega un [`FakeEngine`] por guild y lo recuerda.
#[derive(Default)]
pub struct FakeEngines {
    engines: DashMap<GuildId, Arc<FakeEngine>>,
    built: AtomicUsize,
}

impl FakeEngines {
    pub fn engine(&self, guild_id: GuildId) -> Arc<FakeEngine> {
        self.engines
            .get(&guild_id)
            .map(|e| Arc::clone(e.value()))
            .expect("no engine built for guild")
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

impl EngineFactory for FakeEngines {
    fn create_engine(&self, guild_id: GuildId) -> Arc<dyn PlayerEngine> {
        self.built.fetch_add(1, Ordering::SeqCst);
        let engine = Arc::new(FakeEngine::default());
        self.engines.insert(guild_id, engine.clone());
        engine
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    NowPlaying(String),
    Idle,
}

#[derive(Default)]
pub struct RecordingPresence {
    events: Mutex<Vec<PresenceEvent>>,
}

impl RecordingPresence {
    pub fn events(&self) -> Vec<PresenceEvent> {
        self.events.lock().clone()
    }

    pub fn last(&self) -> Option<PresenceEvent> {
        self.events.lock().last().cloned()
    }
}

impl PresenceUpdater for RecordingPresence {
    fn set_now_playing(&self, title: &str) {
        self.events.lock().push(PresenceEvent::NowPlaying(title.to_string()));
    }

    fn set_idle(&self) {
        self.events.lock().push(PresenceEvent::Idle);
    }
}

/// Responde desde una tabla fija por identificador; lo desconocido no encuentra nada.
#[derive(Default)]
pub struct TableResolver {
    results: HashMap<String, LoadResult>,
    failures: HashMap<String, String>,
}

impl TableResolver {
    pub fn with(mut self, identifier: &str, result: LoadResult) -> Self {
        self.results.insert(identifier.to_string(), result);
        self
    }

    pub fn failing(mut self, identifier: &str, message: &str) -> Self {
        self.failures.insert(identifier.to_string(), message.to_string());
        self
    }
}

#[async_trait]
impl MediaResolver for TableResolver {
    async fn load(&self, identifier: &str) -> Result<LoadResult, LoadError> {
        tokio::task::yield_now().await;
        if let Some(message) = self.failures.get(identifier) {
            return Err(LoadError::Exception {
                message: message.clone(),
                severity: "fault".to_string(),
            });
        }
        Ok(self
            .results
            .get(identifier)
            .cloned()
            .unwrap_or(LoadResult::Empty))
    }
}

pub struct Harness {
    pub player: AudioPlayer,
    pub engines: Arc<FakeEngines>,
    pub presence: Arc<RecordingPresence>,
    pub sinks: Arc<SinkRegistry>,
}

pub fn harness(resolver: TableResolver) -> Harness {
    init_logging();

    let engines = Arc::new(FakeEngines::default());
    let presence = Arc::new(RecordingPresence::default());
    let sinks = Arc::new(SinkRegistry::new());
    let registry = Arc::new(SessionRegistry::new(
        engines.clone(),
        presence.clone(),
        sinks.clone(),
        64,
    ));
    let resolver = TrackResolutionClient::new(Arc::new(resolver), Duration::from_secs(2), "ytsearch:");

    Harness {
        player: AudioPlayer::new(registry, resolver),
        engines,
        presence,
        sinks,
    }
}
