use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8001/api";
pub const DEFAULT_POLL_SECS: u64 = 2;
pub const DEFAULT_TOKEN_FILE: &str = ".sofimar-admin-token";

/// Runtime settings, read from the environment (and `.env` via `dotenvy`).
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub token_file: PathBuf,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

impl AdminConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Invalid values fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_base_url = lookup("SOFIMAR_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_base_url);

        let poll_interval = match lookup("SOFIMAR_POLL_SECS") {
            None => defaults.poll_interval,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs >= 1 => Duration::from_secs(secs),
                _ => {
                    warn!("Ignoring SOFIMAR_POLL_SECS={raw:?}; using {DEFAULT_POLL_SECS}s");
                    defaults.poll_interval
                }
            },
        };

        let token_file = lookup("SOFIMAR_TOKEN_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.token_file);

        Self { api_base_url, poll_interval, token_file }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AdminConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.token_file, PathBuf::from(DEFAULT_TOKEN_FILE));
    }

    #[test]
    fn values_are_read_and_normalised() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("SOFIMAR_API_URL", "https://example.ro/api/"),
            ("SOFIMAR_POLL_SECS", "5"),
            ("SOFIMAR_TOKEN_FILE", "/tmp/tok"),
        ]));
        assert_eq!(config.api_base_url, "https://example.ro/api");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.token_file, PathBuf::from("/tmp/tok"));
    }

    #[test]
    fn bad_poll_interval_falls_back() {
        for raw in ["0", "soon", "-3"] {
            let config = AdminConfig::from_lookup(lookup(&[("SOFIMAR_POLL_SECS", raw)]));
            assert_eq!(config.poll_interval, Duration::from_secs(DEFAULT_POLL_SECS));
        }
    }
}
