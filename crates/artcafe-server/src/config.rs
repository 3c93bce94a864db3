//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so the server starts with zero configuration
//! for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use artcafe_shared::constants::{DEFAULT_HTTP_PORT, MAX_UPLOAD_SIZE};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite file. `None` means the platform data directory.
    /// Env: `DATABASE_PATH`
    pub database_path: Option<PathBuf>,

    /// Root under which uploaded images are written and served.
    /// Env: `UPLOAD_DIR`
    /// Default: `./uploads`
    pub upload_dir: PathBuf,

    /// Largest accepted image, in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 10 MiB
    pub max_upload_size: usize,

    /// Bearer token lifetime.
    /// Env: `SESSION_TTL_HOURS`
    /// Default: `24`
    pub session_ttl_hours: i64,

    /// How long browsers may cache a CORS preflight.
    /// Env: `CORS_MAX_AGE_SECS`
    /// Default: `3600`
    pub cors_max_age_secs: u64,

    /// Sustained requests per second allowed per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    /// Default: `20`
    pub rate_limit_per_sec: f64,

    /// Burst size on top of the sustained rate.
    /// Env: `RATE_LIMIT_BURST`
    /// Default: `60`
    pub rate_limit_burst: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            upload_dir: PathBuf::from("./uploads"),
            max_upload_size: MAX_UPLOAD_SIZE,
            session_ttl_hours: 24,
            cors_max_age_secs: 3600,
            rate_limit_per_sec: 20.0,
            rate_limit_burst: 60.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Invalid values are
    /// logged and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            parse_into(&mut config.http_addr, "HTTP_ADDR", &addr);
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("UPLOAD_DIR").filter(|p| !p.is_empty()) {
            config.upload_dir = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_UPLOAD_SIZE") {
            parse_into(&mut config.max_upload_size, "MAX_UPLOAD_SIZE", &val);
        }

        if let Some(val) = lookup("SESSION_TTL_HOURS") {
            parse_into(&mut config.session_ttl_hours, "SESSION_TTL_HOURS", &val);
            if config.session_ttl_hours <= 0 {
                tracing::warn!(value = %val, "SESSION_TTL_HOURS must be positive, using default");
                config.session_ttl_hours = Self::default().session_ttl_hours;
            }
        }

        if let Some(val) = lookup("CORS_MAX_AGE_SECS") {
            parse_into(&mut config.cors_max_age_secs, "CORS_MAX_AGE_SECS", &val);
        }

        if let Some(val) = lookup("RATE_LIMIT_PER_SEC") {
            parse_into(&mut config.rate_limit_per_sec, "RATE_LIMIT_PER_SEC", &val);
        }

        if let Some(val) = lookup("RATE_LIMIT_BURST") {
            parse_into(&mut config.rate_limit_burst, "RATE_LIMIT_BURST", &val);
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

fn parse_into<T: std::str::FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(key, value = %raw, "Invalid setting, using default"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.database_path, None);
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
        assert_eq!(config.session_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/artcafe.db"),
            ("UPLOAD_DIR", "/srv/images"),
            ("MAX_UPLOAD_SIZE", "2048"),
            ("SESSION_TTL_HOURS", "2"),
        ]));
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/artcafe.db")));
        assert_eq!(config.upload_dir, PathBuf::from("/srv/images"));
        assert_eq!(config.max_upload_size, 2048);
        assert_eq!(config.session_ttl_hours, 2);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HTTP_ADDR", "not-an-address"),
            ("MAX_UPLOAD_SIZE", "lots"),
            ("SESSION_TTL_HOURS", "-3"),
        ]));
        let defaults = ServerConfig::default();
        assert_eq!(config.http_addr, defaults.http_addr);
        assert_eq!(config.max_upload_size, defaults.max_upload_size);
        assert_eq!(config.session_ttl_hours, defaults.session_ttl_hours);
    }
}
