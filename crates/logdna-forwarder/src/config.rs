// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_TIMEOUT_SECS, DEFAULT_INGEST_URL, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BACKOFF_MS,
};
use crate::error::ConfigError;
use crate::formatter::Template;
use crate::hostname::resolve_hostname;
use crate::retry::RetryStrategy;

/// Immutable settings for one forwarding pipeline.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    /// Reported to the intake as the `hostname` query parameter.
    pub hostname: String,
    /// Lines per batch; a batch ships as soon as it holds this many.
    pub batch_size: usize,
    pub template: Template,
    pub ingest_url: String,
    /// Per-request timeout, covering connect through response body.
    pub flush_timeout: Duration,
    /// Ships a partial batch on every tick when set.
    pub flush_interval: Option<Duration>,
    pub retry_strategy: RetryStrategy,
    pub proxy_https: Option<String>,
}

impl Config {
    /// Configuration with defaults for everything but the key and hostname.
    #[must_use]
    pub fn new(api_key: impl Into<String>, hostname: impl Into<String>) -> Self {
        Config {
            api_key: api_key.into(),
            hostname: hostname.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            template: Template::default(),
            ingest_url: DEFAULT_INGEST_URL.to_string(),
            flush_timeout: Duration::from_secs(DEFAULT_FLUSH_TIMEOUT_SECS),
            flush_interval: None,
            retry_strategy: RetryStrategy::ExponentialBackoff(
                DEFAULT_RETRY_ATTEMPTS,
                DEFAULT_RETRY_BACKOFF_MS,
            ),
            proxy_https: None,
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let api_key = get("API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let hostname = resolve_hostname(get("LOGDNA_HOSTNAME"), get("HOSTNAME"));
        let mut config = Config::new(api_key, hostname);

        if let Some(value) = get("BATCH_SIZE") {
            config.batch_size = parse_positive("BATCH_SIZE", &value)?;
        }
        if let Some(value) = get("RAW_FORMAT") {
            config.template = Template::parse(&value)?;
        }
        if let Some(value) = get("LOGDNA_URL") {
            config.ingest_url = parse_url("LOGDNA_URL", value)?;
        }
        if let Some(value) = get("FLUSH_TIMEOUT") {
            config.flush_timeout = Duration::from_secs(parse_positive("FLUSH_TIMEOUT", &value)?);
        }
        if let Some(value) = get("FLUSH_INTERVAL") {
            let secs: u64 = parse("FLUSH_INTERVAL", &value)?;
            config.flush_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        let attempts = match get("RETRY_ATTEMPTS") {
            Some(value) => parse_positive("RETRY_ATTEMPTS", &value)?,
            None => DEFAULT_RETRY_ATTEMPTS,
        };
        let backoff_ms = match get("RETRY_BACKOFF_MS") {
            Some(value) => parse("RETRY_BACKOFF_MS", &value)?,
            None => DEFAULT_RETRY_BACKOFF_MS,
        };
        config.retry_strategy = RetryStrategy::ExponentialBackoff(attempts, backoff_ms);

        config.proxy_https = get("HTTPS_PROXY");

        Ok(config)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("batch_size", &self.batch_size)
            .field("template", &self.template.source())
            .field("ingest_url", &self.ingest_url)
            .field("flush_timeout", &self.flush_timeout)
            .field("flush_interval", &self.flush_interval)
            .field("retry_strategy", &self.retry_strategy)
            .field("proxy_https", &self.proxy_https)
            .finish()
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Only absolute `http`/`https` URLs are accepted.
fn parse_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key,
        value: value.clone(),
        reason,
    };
    let url = reqwest::Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    Ok(value.trim().to_string())
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: fmt::Display,
{
    let parsed: T = parse(key, value)?;
    if parsed == T::default() {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::LogMessage;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_error_if_no_api_key() {
        let err = Config::from_lookup(lookup_from(&[("BATCH_SIZE", "5")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert_eq!(err.to_string(), "API_KEY not specified");
    }

    #[test]
    fn test_error_if_api_key_empty() {
        let err = Config::from_lookup(lookup_from(&[("API_KEY", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("HOSTNAME", "box-1")])).unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.hostname, "box-1");
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.template, Template::default());
        assert_eq!(config.ingest_url, DEFAULT_INGEST_URL);
        assert_eq!(config.flush_timeout, Duration::from_secs(30));
        assert_eq!(config.flush_interval, None);
        assert_eq!(
            config.retry_strategy,
            RetryStrategy::ExponentialBackoff(3, 100)
        );
        assert_eq!(config.proxy_https, None);
    }

    #[test]
    fn test_batch_size_is_applied() {
        let config =
            Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("BATCH_SIZE", "250")])).unwrap();
        assert_eq!(config.batch_size, 250);
    }

    #[test]
    fn test_invalid_batch_size() {
        for value in ["0", "-3", "ten"] {
            let err = Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("BATCH_SIZE", value)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: "BATCH_SIZE", .. }),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_raw_format_is_compiled() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_KEY", "k"),
            ("RAW_FORMAT", "{{.Source}}: {{.Data}}"),
        ]))
        .unwrap();
        let rendered = config
            .template
            .render(&LogMessage::new("stderr", "boom"))
            .unwrap();
        assert_eq!(rendered, "stderr: boom");
    }

    #[test]
    fn test_invalid_raw_format() {
        let err = Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("RAW_FORMAT", "{{.Data")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Template(_)));
    }

    #[test]
    fn test_hostname_override() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_KEY", "k"),
            ("HOSTNAME", "container-id"),
            ("LOGDNA_HOSTNAME", "pretty-name"),
        ]))
        .unwrap();
        assert_eq!(config.hostname, "pretty-name");
    }

    #[test]
    fn test_transport_settings() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_KEY", "k"),
            ("LOGDNA_URL", "http://127.0.0.1:9000/logs/ingest"),
            ("FLUSH_TIMEOUT", "5"),
            ("FLUSH_INTERVAL", "2"),
            ("RETRY_ATTEMPTS", "6"),
            ("RETRY_BACKOFF_MS", "0"),
            ("HTTPS_PROXY", "http://proxy:3128"),
        ]))
        .unwrap();
        assert_eq!(config.ingest_url, "http://127.0.0.1:9000/logs/ingest");
        assert_eq!(config.flush_timeout, Duration::from_secs(5));
        assert_eq!(config.flush_interval, Some(Duration::from_secs(2)));
        assert_eq!(config.retry_strategy, RetryStrategy::ExponentialBackoff(6, 0));
        assert_eq!(config.proxy_https.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn test_invalid_ingest_url() {
        for value in ["not a url", "/logs/ingest", "ftp://logs.example.com/ingest"] {
            let err = Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("LOGDNA_URL", value)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: "LOGDNA_URL", .. }),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_flush_interval_disables_timer() {
        let config =
            Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("FLUSH_INTERVAL", "0")]))
                .unwrap();
        assert_eq!(config.flush_interval, None);
    }

    #[test]
    fn test_invalid_timeout_and_retries() {
        let err = Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("FLUSH_TIMEOUT", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "FLUSH_TIMEOUT", .. }));

        let err = Config::from_lookup(lookup_from(&[("API_KEY", "k"), ("RETRY_ATTEMPTS", "x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "RETRY_ATTEMPTS", .. }));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config::new("super-secret-key", "h");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super-secret-key"));
        assert!(debug_str.contains("<redacted>"));
        assert!(debug_str.contains("{{.Data}}"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("API_KEY", "_not_a_real_key_");
        env::set_var("BATCH_SIZE", "7");
        env::set_var("LOGDNA_HOSTNAME", "env-test-host");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_key, "_not_a_real_key_");
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.hostname, "env-test-host");

        env::remove_var("API_KEY");
        env::remove_var("BATCH_SIZE");
        env::remove_var("LOGDNA_HOSTNAME");
    }

    #[test]
    #[serial]
    fn test_from_env_without_api_key() {
        env::remove_var("API_KEY");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }
}
