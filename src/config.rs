use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    /// Map-based location entry: checkpoints must carry coordinates.
    pub require_coordinates: bool,
    pub tracking_prefix: String,
    pub refresh_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tracking_prefix = lookup("TRACKING_PREFIX").unwrap_or_else(|| "PT".to_string());
        if !tracking_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::Internal(format!(
                "invalid TRACKING_PREFIX: {tracking_prefix:?} must be alphanumeric"
            )));
        }

        let refresh_secs: u64 = parse_or_default(&lookup, "REFRESH_INTERVAL_SECS", 30)?;
        if refresh_secs == 0 {
            return Err(AppError::Internal(
                "invalid REFRESH_INTERVAL_SECS: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default(&lookup, "HTTP_PORT", 3000)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            event_buffer_size: parse_or_default(&lookup, "EVENT_BUFFER_SIZE", 1024)?,
            require_coordinates: parse_or_default(&lookup, "REQUIRE_COORDINATES", false)?,
            tracking_prefix,
            refresh_interval: Duration::from_secs(refresh_secs),
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::Config;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, crate::error::AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.http_port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.event_buffer_size, 1024);
        assert!(!config.require_coordinates);
        assert_eq!(config.tracking_prefix, "PT");
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("HTTP_PORT", "8080"),
            ("REQUIRE_COORDINATES", "true"),
            ("TRACKING_PREFIX", "SHIP"),
            ("REFRESH_INTERVAL_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.http_port, 8080);
        assert!(config.require_coordinates);
        assert_eq!(config.tracking_prefix, "SHIP");
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config_from(&[("HTTP_PORT", "eighty")]).is_err());
        assert!(config_from(&[("REQUIRE_COORDINATES", "maybe")]).is_err());
        assert!(config_from(&[("TRACKING_PREFIX", "P-T")]).is_err());
        assert!(config_from(&[("REFRESH_INTERVAL_SECS", "0")]).is_err());
    }
}
