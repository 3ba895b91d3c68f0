//! Turning user queries into playable tracks.

pub mod lavalink;

use async_trait::async_trait;
use reqwest::StatusCode;
use serenity::model::id::UserId;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

use crate::audio::{queue::QueueEntry, scheduler::TrackScheduler, track::Track};

pub use lavalink::LavalinkResolver;

/// Lo que encontró el backend para un identificador.
#[derive(Debug, Clone)]
pub enum LoadResult {
    Track(Track),
    Playlist { name: String, tracks: Vec<Track> },
    /// Resultados ordenados de una búsqueda.
    Search(Vec<Track>),
    Empty,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered {0}")]
    Status(StatusCode),

    #[error("backend could not load the track ({severity}): {message}")]
    Exception { message: String, severity: String },
}

/// Por qué una consulta no terminó en la cola.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no results for `{query}`")]
    NoMatches { query: String },

    #[error("could not resolve `{query}`: {source}")]
    Failed {
        query: String,
        #[source]
        source: LoadError,
    },
}

/// Lo que una resolución exitosa agregó a la cola.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Track { title: String },
    Playlist { name: String, count: usize },
}

/// Servicio de búsqueda de medios.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn load(&self, identifier: &str) -> Result<LoadResult, LoadError>;
}

/// Resuelve consultas en segundo plano y entrega los resultados a un scheduler.
#[derive(Clone)]
pub struct TrackResolutionClient {
    resolver: Arc<dyn MediaResolver>,
    timeout: Duration,
    search_prefix: String,
}

impl TrackResolutionClient {
    pub fn new(resolver: Arc<dyn MediaResolver>, timeout: Duration, search_prefix: impl Into<String>) -> Self {
        Self {
            resolver,
            timeout,
            search_prefix: search_prefix.into(),
        }
    }

    /// Las URLs http(s) pasan tal cual, todo lo demás se vuelve búsqueda.
    pub fn identifier_for(&self, query: &str) -> String {
        let query = query.trim();
        if is_web_url(query) {
            query.to_string()
        } else {
            format!("{}{}", self.search_prefix, query)
        }
    }

    /// Empieza a resolver `query` y vuelve de inmediato.
    ///
    /// Soltar el handle no cancela la búsqueda; hay que esperarlo para saber
    /// si se encoló algo.
    pub fn resolve(
        &self,
        query: &str,
        scheduler: Arc<TrackScheduler>,
        requester: UserId,
    ) -> JoinHandle<Result<Resolved, ResolveError>> {
        let client = self.clone();
        let query = query.to_string();
        tokio::spawn(async move { client.resolve_into(&query, &scheduler, requester).await })
    }

    /// Resuelve `query` y encola el resultado en `scheduler`.
    ///
    /// Solo agrega al final, así que skips y otras resoluciones concurrentes
    /// pueden intercalarse libremente.
    pub async fn resolve_into(
        &self,
        query: &str,
        scheduler: &TrackScheduler,
        requester: UserId,
    ) -> Result<Resolved, ResolveError> {
        let identifier = self.identifier_for(query);
        let no_matches = || ResolveError::NoMatches {
            query: query.to_string(),
        };

        let loaded = match tokio::time::timeout(self.timeout, self.resolver.load(&identifier)).await {
            Ok(Ok(loaded)) => loaded,
            Ok(Err(source)) => {
                warn!("❌ Error al resolver {}: {}", identifier, source);
                return Err(ResolveError::Failed {
                    query: query.to_string(),
                    source,
                });
            }
            Err(_) => {
                warn!("⏱️ Tiempo agotado resolviendo {} ({:?})", identifier, self.timeout);
                return Err(no_matches());
            }
        };

        match loaded {
            LoadResult::Track(track) => Ok(enqueue_single(scheduler, track, requester)),
            LoadResult::Search(tracks) => {
                let first = tracks.into_iter().next().ok_or_else(no_matches)?;
                Ok(enqueue_single(scheduler, first, requester))
            }
            LoadResult::Playlist { name, tracks } => {
                if tracks.is_empty() {
                    return Err(no_matches());
                }
                let count = scheduler.enqueue_all(
                    tracks
                        .into_iter()
                        .map(|track| QueueEntry::new(track, requester)),
                );
                info!("➕ Agregadas {} canciones de la playlist {}", count, name);
                Ok(Resolved::Playlist { name, count })
            }
            LoadResult::Empty => {
                info!("🔍 Sin resultados para {}", identifier);
                Err(no_matches())
            }
        }
    }
}

fn is_web_url(query: &str) -> bool {
    Url::parse(query).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn enqueue_single(scheduler: &TrackScheduler, track: Track, requester: UserId) -> Resolved {
    let title = track.title().to_string();
    scheduler.enqueue(QueueEntry::new(track, requester));
    Resolved::Track { title }
}
