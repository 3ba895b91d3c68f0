use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::audio::bridge::DEFAULT_FRAME_CAPACITY;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Backend de resolución
    pub lavalink_url: String,
    pub lavalink_password: String,
    pub search_prefix: String,
    #[serde(with = "duration_text")]
    pub resolve_timeout: Duration,

    // Audio
    pub frame_capacity: usize,

    // Ciclo de vida de sesiones
    #[serde(with = "duration_text")]
    pub session_idle_timeout: Duration,
    #[serde(with = "duration_text")]
    pub reaper_interval: Duration,
}

impl Config {
    /// Lee la configuración del entorno, cargando `.env` primero.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            lavalink_url: env_or("LAVALINK_URL", defaults.lavalink_url),
            lavalink_password: env_or("LAVALINK_PASSWORD", defaults.lavalink_password),
            search_prefix: env_or("SEARCH_PREFIX", defaults.search_prefix),
            resolve_timeout: env_duration("RESOLVE_TIMEOUT", defaults.resolve_timeout)?,
            frame_capacity: match std::env::var("FRAME_CAPACITY") {
                Ok(val) if !val.trim().is_empty() => val
                    .trim()
                    .parse()
                    .with_context(|| format!("FRAME_CAPACITY is not a number: {val}"))?,
                _ => defaults.frame_capacity,
            },
            session_idle_timeout: env_duration("SESSION_IDLE_TIMEOUT", defaults.session_idle_timeout)?,
            reaper_interval: env_duration("REAPER_INTERVAL", defaults.reaper_interval)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validaciones para detectar errores comunes antes de arrancar.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.lavalink_url)
            .with_context(|| format!("LAVALINK_URL is not a valid URL: {}", self.lavalink_url))?;

        if self.search_prefix.trim().is_empty() {
            anyhow::bail!("Search prefix must not be empty");
        }

        if !(256..=8192).contains(&self.frame_capacity) {
            anyhow::bail!(
                "Frame capacity must be between 256 and 8192 bytes, got: {}",
                self.frame_capacity
            );
        }

        if self.resolve_timeout.is_zero() {
            anyhow::bail!("Resolve timeout must be greater than 0");
        }

        if self.session_idle_timeout.is_zero() || self.reaper_interval.is_zero() {
            anyhow::bail!("Session idle timeout and reaper interval must be greater than 0");
        }

        Ok(())
    }

    /// Resumen en una línea para el log de inicio. Omite la contraseña.
    pub fn summary(&self) -> String {
        format!(
            "Lavalink {} | search {} | resolve timeout {} | frame {}B | idle eviction after {} (every {})",
            self.lavalink_url,
            self.search_prefix,
            humantime::format_duration(self.resolve_timeout),
            self.frame_capacity,
            humantime::format_duration(self.session_idle_timeout),
            humantime::format_duration(self.reaper_interval),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lavalink_url: "http://localhost:2333".to_string(),
            lavalink_password: "youshallnotpass".to_string(),
            search_prefix: "ytsearch:".to_string(),
            resolve_timeout: Duration::from_secs(10),
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            session_idle_timeout: Duration::from_secs(15 * 60),
            reaper_interval: Duration::from_secs(60),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .unwrap_or(default)
}

fn env_duration(key: &str, default: Duration) -> Result<Duration> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => humantime::parse_duration(val.trim())
            .with_context(|| format!("{key} is not a duration (try `10s` or `15m`): {val}")),
        _ => Ok(default),
    }
}

/// Duraciones como texto humantime (`"10s"`, `"15m"`) al serializar.
mod duration_text {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_capacity, DEFAULT_FRAME_CAPACITY);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_url = Config {
            lavalink_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(bad_url.validate().is_err());

        let tiny_frames = Config {
            frame_capacity: 16,
            ..Config::default()
        };
        assert!(tiny_frames.validate().is_err());

        let no_prefix = Config {
            search_prefix: " ".to_string(),
            ..Config::default()
        };
        assert!(no_prefix.validate().is_err());

        let no_timeout = Config {
            resolve_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_summary_hides_password() {
        let summary = Config::default().summary();
        assert!(summary.contains("http://localhost:2333"));
        assert!(summary.contains("15m"));
        assert!(!summary.contains("youshallnotpass"));
    }

    #[test]
    fn test_durations_serialize_as_text() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["resolve_timeout"], "10s");

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back.session_idle_timeout, Duration::from_secs(900));
    }
}
