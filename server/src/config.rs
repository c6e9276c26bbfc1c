use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TURN_DURATION_MS: u64 = 60_000;
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub turn_duration: Duration,
    /// Egress buffer per connection. Messages beyond it are dropped for that
    /// connection only.
    pub outbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            turn_duration: Duration::from_millis(DEFAULT_TURN_DURATION_MS),
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT`, `TURN_DURATION_MS` and `OUTBOX_CAPACITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host;
        }
        if let Some(value) = lookup("PORT") {
            config.port = value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: value.clone(),
                expected: "a port number",
            })?;
        }
        if let Some(value) = lookup("TURN_DURATION_MS") {
            let millis: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "TURN_DURATION_MS",
                value: value.clone(),
                expected: "a number of milliseconds",
            })?;
            config.turn_duration = Duration::from_millis(millis);
        }
        if let Some(value) = lookup("OUTBOX_CAPACITY") {
            config.outbox_capacity = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "OUTBOX_CAPACITY",
                    value: value.clone(),
                    expected: "a positive integer",
                })?;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn it_uses_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).expect("");
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.turn_duration, Duration::from_secs(60));
        assert_eq!(config.bind_address(), ("127.0.0.1".to_owned(), 3000));
    }

    #[test]
    fn it_reads_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", " 8080 "),
            ("TURN_DURATION_MS", "1500"),
            ("OUTBOX_CAPACITY", "8"),
        ]))
        .expect("");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.turn_duration, Duration::from_millis(1500));
        assert_eq!(config.outbox_capacity, 8);
    }

    #[test]
    fn it_rejects_invalid_values() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "http".into(),
                expected: "a port number",
            }
        );
        assert!(ServerConfig::from_lookup(lookup_from(&[("TURN_DURATION_MS", "-1")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("OUTBOX_CAPACITY", "0")])).is_err());
    }
}
