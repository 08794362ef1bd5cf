//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable                  | Default   | Meaning                          |
//! |---------------------------|-----------|----------------------------------|
//! | `HOST`                    | `0.0.0.0` | Interface to bind                |
//! | `PORT`                    | `8080`    | Port to listen on                |
//! | `SWEEP_INTERVAL_SECS`     | `3600`    | Seconds between registry sweeps  |
//! | `OUTBOUND_QUEUE_CAPACITY` | `256`     | Messages buffered per connection |
//! | `LOG_FORMAT`              | `text`    | `json` for structured log lines  |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::domain::outbound;
use crate::error::RelayError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default seconds between registry sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Seconds between defensive registry sweeps.
    pub sweep_interval_secs: u64,

    /// Messages buffered per connection before delivery to it is dropped.
    pub outbound_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            outbound_capacity: outbound::DEFAULT_CAPACITY,
            log_format: LogFormat::Text,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// See [`RelayConfig::from_lookup`].
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if `HOST` is not an IP
    /// address, `PORT` is not a port number, or `SWEEP_INTERVAL_SECS` or
    /// `OUTBOUND_QUEUE_CAPACITY` is zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let defaults = Self::default();

        let host: IpAddr = match lookup("HOST") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| RelayError::InvalidConfig(format!("HOST={raw}: {e}")))?,
            None => defaults.listen_addr.ip(),
        };

        let port: u16 = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| RelayError::InvalidConfig(format!("PORT={raw}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let sweep_interval_secs =
            parse_or(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
        if sweep_interval_secs == 0 {
            return Err(RelayError::InvalidConfig(
                "SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let outbound_capacity =
            parse_or(&lookup, "OUTBOUND_QUEUE_CAPACITY", outbound::DEFAULT_CAPACITY);
        if outbound_capacity == 0 {
            return Err(RelayError::InvalidConfig(
                "OUTBOUND_QUEUE_CAPACITY must be greater than zero".to_string(),
            ));
        }

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            sweep_interval_secs,
            outbound_capacity,
            log_format,
        })
    }

    /// Sweep cadence as a [`Duration`].
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, RelayError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let Ok(config) = load(&[]) else {
            panic!("defaults should load");
        };
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn port_and_host_override() {
        let Ok(config) = load(&[("PORT", "9001"), ("HOST", "127.0.0.1")]) else {
            panic!("valid config");
        };
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:9001");
    }

    #[test]
    fn invalid_port_is_an_error() {
        for port in ["eighty", "70000", ""] {
            let result = load(&[("PORT", port)]);
            assert!(
                matches!(result, Err(RelayError::InvalidConfig(_))),
                "PORT={port} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_host_is_an_error() {
        assert!(load(&[("HOST", "not-an-ip")]).is_err());
    }

    #[test]
    fn sweep_interval_parsing() {
        let Ok(config) = load(&[("SWEEP_INTERVAL_SECS", "60")]) else {
            panic!("valid config");
        };
        assert_eq!(config.sweep_interval_secs, 60);

        let Ok(fallback) = load(&[("SWEEP_INTERVAL_SECS", "soon")]) else {
            panic!("garbage falls back to default");
        };
        assert_eq!(fallback.sweep_interval_secs, DEFAULT_SWEEP_INTERVAL_SECS);

        assert!(load(&[("SWEEP_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn outbound_capacity_parsing() {
        let Ok(defaults) = load(&[]) else {
            panic!("defaults should load");
        };
        assert_eq!(defaults.outbound_capacity, outbound::DEFAULT_CAPACITY);

        let Ok(config) = load(&[("OUTBOUND_QUEUE_CAPACITY", "32")]) else {
            panic!("valid config");
        };
        assert_eq!(config.outbound_capacity, 32);

        assert!(matches!(
            load(&[("OUTBOUND_QUEUE_CAPACITY", "0")]),
            Err(RelayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn json_log_format() {
        let Ok(config) = load(&[("LOG_FORMAT", "json")]) else {
            panic!("valid config");
        };
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
