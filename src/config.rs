//! Configuration loader for the `codemetal-sensorlens` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Every variable is optional; a value that is set
//! but does not parse fails startup with a message naming the variable.
//!
use std::{env, net::SocketAddr};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::pipeline::LoaderOptions;

/// Parse an optional environment variable into `$ty`, with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Description of the measurement site served by `GET /site`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteInfo {
    // ---
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub sensor_type: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        SiteInfo {
            latitude: 6.2479,
            longitude: -75.6081,
            altitude_m: 1495.0,
            sensor_type: "ESP32".to_string(),
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Listen address of the HTTP server.
    pub bind_addr: SocketAddr,

    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,

    /// Number of concurrent sessions kept before the oldest is evicted.
    pub max_sessions: usize,

    /// Idle time after which a session is dropped.
    pub session_ttl_secs: u64,

    /// Time column name and accepted timestamp formats.
    pub loader: LoaderOptions,

    /// Static site description.
    pub site: SiteInfo,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_upload_bytes: 10 * 1024 * 1024,
            max_sessions: 64,
            session_ttl_secs: 3600,
            loader: LoaderOptions::default(),
            site: SiteInfo::default(),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `MAX_UPLOAD_BYTES` – upload size cap (default: 10 MiB)
/// - `MAX_SESSIONS` – live sessions kept (default: 64)
/// - `SESSION_TTL_SECS` – idle session lifetime (default: 3600)
/// - `TIME_COLUMN` – header of the time column (default: `Time`)
/// - `TIMESTAMP_FORMATS` – `;`-separated chrono formats, tried in order
/// - `SITE_LATITUDE`, `SITE_LONGITUDE`, `SITE_ALTITUDE_M` – site description
///
/// Returns an error if any variable is set but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let bind_addr = parse_env!("BIND_ADDR", SocketAddr, defaults.bind_addr);
    let max_upload_bytes = parse_env!("MAX_UPLOAD_BYTES", usize, defaults.max_upload_bytes);
    let max_sessions = parse_env!("MAX_SESSIONS", usize, defaults.max_sessions);
    let session_ttl_secs = parse_env!("SESSION_TTL_SECS", u64, defaults.session_ttl_secs);

    if max_sessions == 0 {
        return Err(anyhow!("Invalid MAX_SESSIONS: must be at least 1"));
    }
    if session_ttl_secs == 0 {
        return Err(anyhow!("Invalid SESSION_TTL_SECS: must be at least 1"));
    }

    let time_column = env::var("TIME_COLUMN")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(defaults.loader.time_column);

    let timestamp_formats = match env::var("TIMESTAMP_FORMATS") {
        Ok(raw) => parse_formats(&raw)?,
        Err(_) => defaults.loader.timestamp_formats,
    };

    let site = SiteInfo {
        latitude: parse_env!("SITE_LATITUDE", f64, defaults.site.latitude),
        longitude: parse_env!("SITE_LONGITUDE", f64, defaults.site.longitude),
        altitude_m: parse_env!("SITE_ALTITUDE_M", f64, defaults.site.altitude_m),
        sensor_type: defaults.site.sensor_type,
    };

    Ok(Config {
        bind_addr,
        max_upload_bytes,
        max_sessions,
        session_ttl_secs,
        loader: LoaderOptions {
            time_column,
            timestamp_formats,
        },
        site,
    })
}

/// Split a `;`-separated format list, dropping empty entries.
fn parse_formats(raw: &str) -> Result<Vec<String>> {
    // ---
    let formats: Vec<String> = raw
        .split(';')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect();

    if formats.is_empty() {
        return Err(anyhow!("Invalid TIMESTAMP_FORMATS: no formats given"));
    }
    Ok(formats)
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  BIND_ADDR         : {}", self.bind_addr);
        tracing::info!("  MAX_UPLOAD_BYTES  : {}", self.max_upload_bytes);
        tracing::info!("  MAX_SESSIONS      : {}", self.max_sessions);
        tracing::info!("  SESSION_TTL_SECS  : {}", self.session_ttl_secs);
        tracing::info!("  TIME_COLUMN       : {}", self.loader.time_column);
        tracing::info!(
            "  TIMESTAMP_FORMATS : {}",
            self.loader.timestamp_formats.join(" ; ")
        );
        tracing::info!(
            "  SITE              : {}, {} ({} m)",
            self.site.latitude,
            self.site.longitude,
            self.site.altitude_m
        );
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_parse_formats() {
        // ---
        let formats = parse_formats(" %Y-%m-%d %H:%M ; ;%d/%m/%Y").unwrap();
        assert_eq!(formats, vec!["%Y-%m-%d %H:%M", "%d/%m/%Y"]);
    }

    #[test]
    fn test_parse_formats_rejects_empty() {
        // ---
        assert!(parse_formats(" ; ").is_err());
    }

    #[test]
    fn test_defaults() {
        // ---
        let cfg = Config::default();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.loader.time_column, "Time");
        assert!(!cfg.loader.timestamp_formats.is_empty());
        assert_eq!(cfg.site.sensor_type, "ESP32");
    }
}
