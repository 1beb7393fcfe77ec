//! Daemon configuration
//!
//! All configuration is read from environment variables. Loading goes
//! through a lookup function so tests never touch the process environment.

use anyhow::{Context, Result};
use localname_core::SyncConfig;
use localname_provider_route53::Route53Credentials;
use std::net::SocketAddr;
use std::time::Duration;

/// Where Prometheus metrics are served unless overridden
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration
pub struct Config {
    /// Record, zone, interval and adapter settings
    pub sync: SyncConfig,

    /// AWS credentials for Route 53
    pub credentials: Route53Credentials,

    /// Prometheus listener address
    pub metrics_addr: SocketAddr,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} is required. Set it via: export {}=...", key, key))
        };

        let domain = required("LOCALNAME_DOMAIN")?;
        let zone_id = required("LOCALNAME_ZONE_ID")?;
        let poll_freq = required("LOCALNAME_POLL_FREQ")?;
        let poll_interval = parse_poll_freq(&poll_freq)
            .with_context(|| format!("unable to parse LOCALNAME_POLL_FREQ: {}", poll_freq))?;

        let mut sync = SyncConfig::new(domain.trim(), zone_id.trim(), poll_interval);
        if let Some(url) = lookup("LOCALNAME_IP_SERVICE_URL").filter(|u| !u.is_empty()) {
            sync.resolver.url = url;
        }

        let credentials = Route53Credentials::new(
            required("AWS_ACCESS_KEY_ID")?,
            required("AWS_SECRET_ACCESS_KEY")?,
            lookup("AWS_SESSION_TOKEN"),
        )?;

        let metrics_addr = lookup("LOCALNAME_METRICS_ADDR")
            .unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string());
        let metrics_addr = metrics_addr
            .parse()
            .with_context(|| format!("LOCALNAME_METRICS_ADDR is not a socket address: {}", metrics_addr))?;

        Ok(Self {
            sync,
            credentials,
            metrics_addr,
            log_level: lookup("LOCALNAME_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.sync.validate()?;

        if self.sync.resolver.url.starts_with("http://") {
            tracing::warn!(
                "LOCALNAME_IP_SERVICE_URL uses HTTP (not HTTPS). \
                The reported address can be tampered with in transit."
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LOCALNAME_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse a poll frequency such as `30`, `45s`, `5m`, `1h` or `1m30s`
///
/// A bare number is seconds. The result must be a positive whole number of
/// seconds.
pub fn parse_poll_freq(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("empty duration");
    }

    if let Ok(secs) = input.parse::<u64>() {
        return positive_whole_seconds(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            anyhow::bail!("expected a number at '{}'", rest);
        }
        let value: u64 = rest[..digits].parse()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ms" => Duration::from_millis(1),
            "s" => Duration::from_secs(1),
            "m" => Duration::from_secs(60),
            "h" => Duration::from_secs(3600),
            "" => anyhow::bail!("missing unit after {}", value),
            other => anyhow::bail!("unknown unit '{}' (valid: ms, s, m, h)", other),
        };
        rest = &rest[unit_len..];

        let part = unit
            .checked_mul(u32::try_from(value)?)
            .context("duration overflow")?;
        total = total.checked_add(part).context("duration overflow")?;
    }

    positive_whole_seconds(total)
}

fn positive_whole_seconds(d: Duration) -> Result<Duration> {
    if d.is_zero() {
        anyhow::bail!("poll frequency must be greater than zero");
    }
    if d.subsec_nanos() != 0 {
        anyhow::bail!("poll frequency must be a whole number of seconds");
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("LOCALNAME_DOMAIN", "home.example.com"),
        ("LOCALNAME_ZONE_ID", "Z0123456789"),
        ("LOCALNAME_POLL_FREQ", "5m"),
        ("AWS_ACCESS_KEY_ID", "AKIATEST"),
        ("AWS_SECRET_ACCESS_KEY", "secret"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = BASE.to_vec();
        pairs.retain(|(k, _)| !extra.iter().any(|(e, _)| e == k));
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn loads_minimal_environment() {
        let config = Config::from_lookup(env(BASE)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.sync.hostname, "home.example.com");
        assert_eq!(config.sync.zone_id, "Z0123456789");
        assert_eq!(config.sync.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.sync.resolver.url, "https://api.ipify.org");
        assert_eq!(config.metrics_addr, DEFAULT_METRICS_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "info");
        assert!(config.credentials.session_token.is_none());
    }

    #[test]
    fn optional_overrides_are_applied() {
        let config = Config::from_lookup(env(&with(&[
            ("LOCALNAME_IP_SERVICE_URL", "https://ip.example.net/ip"),
            ("LOCALNAME_METRICS_ADDR", "127.0.0.1:9100"),
            ("LOCALNAME_LOG_LEVEL", "debug"),
            ("AWS_SESSION_TOKEN", "sts"),
        ])))
        .unwrap();

        assert_eq!(config.sync.resolver.url, "https://ip.example.net/ip");
        assert_eq!(config.metrics_addr, "127.0.0.1:9100".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.credentials.session_token.as_deref(), Some("sts"));
    }

    #[test]
    fn missing_required_variables_are_reported() {
        for key in [
            "LOCALNAME_DOMAIN",
            "LOCALNAME_ZONE_ID",
            "LOCALNAME_POLL_FREQ",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
        ] {
            let pairs: Vec<_> = BASE.iter().filter(|(k, _)| *k != key).copied().collect();
            let err = Config::from_lookup(env(&pairs)).err().unwrap();
            assert!(err.to_string().contains(key), "{}: {}", key, err);
        }
    }

    #[test]
    fn invalid_poll_freq_is_rejected() {
        let result = Config::from_lookup(env(&with(&[("LOCALNAME_POLL_FREQ", "often")])));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_domain_fails_validation() {
        let config =
            Config::from_lookup(env(&with(&[("LOCALNAME_DOMAIN", "bad..example.com")]))).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_log_level_fails_validation() {
        let config =
            Config::from_lookup(env(&with(&[("LOCALNAME_LOG_LEVEL", "loud")]))).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_poll_frequencies() {
        assert_eq!(parse_poll_freq("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_poll_freq("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_poll_freq("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_poll_freq("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_poll_freq("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_poll_freq("2000ms").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn rejects_bad_poll_frequencies() {
        for input in ["", "0", "0s", "5x", "m", "1500ms", "-5s", "1.5m"] {
            assert!(parse_poll_freq(input).is_err(), "accepted {:?}", input);
        }
    }
}
