use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};
use serde::{de::IgnoredAny, Deserialize};
use tracing::debug;

use super::{LoadError, LoadResult, MediaResolver};
use crate::audio::track::{Track, TrackInfo};

/// Busca tracks con la API REST de un nodo Lavalink (v4).
pub struct LavalinkResolver {
    http: Client,
    endpoint: String,
    password: String,
}

impl LavalinkResolver {
    pub fn new(base_url: &str, password: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, password)
    }

    pub fn with_client(http: Client, base_url: &str, password: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: format!("{}/v4/loadtracks", base_url.trim_end_matches('/')),
            password: password.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    encoded: String,
    info: TrackInfo,
}

impl From<ApiTrack> for Track {
    fn from(track: ApiTrack) -> Self {
        Track::new(track.encoded, track.info)
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    info: PlaylistInfo,
    tracks: Vec<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiException {
    message: Option<String>,
    severity: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "loadType", content = "data", rename_all = "lowercase")]
enum LoadResponse {
    Track(ApiTrack),
    Playlist(ApiPlaylist),
    Search(Vec<ApiTrack>),
    Empty(IgnoredAny),
    Error(ApiException),
}

impl LoadResponse {
    fn into_result(self) -> Result<LoadResult, LoadError> {
        match self {
            LoadResponse::Track(track) => Ok(LoadResult::Track(track.into())),
            LoadResponse::Playlist(playlist) => Ok(LoadResult::Playlist {
                name: playlist.info.name,
                tracks: playlist.tracks.into_iter().map(Track::from).collect(),
            }),
            LoadResponse::Search(tracks) => Ok(LoadResult::Search(
                tracks.into_iter().map(Track::from).collect(),
            )),
            LoadResponse::Empty(_) => Ok(LoadResult::Empty),
            LoadResponse::Error(exception) => Err(LoadError::Exception {
                message: exception
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
                severity: exception.severity,
            }),
        }
    }
}

#[async_trait]
impl MediaResolver for LavalinkResolver {
    async fn load(&self, identifier: &str) -> Result<LoadResult, LoadError> {
        debug!("🔍 Lavalink loadtracks: {}", identifier);

        let response = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.password)
            .query(&[("identifier", identifier)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status));
        }

        response.json::<LoadResponse>().await?.into_result()
    }
}
