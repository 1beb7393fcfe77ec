//! The record being kept in sync

use std::fmt;

use crate::error::{Error, Result};

/// Hostname and hosted zone of the managed record
///
/// Fixed for the lifetime of a sync loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    hostname: String,
    zone_id: String,
}

impl SyncTarget {
    /// Create a target, validating both fields
    ///
    /// A trailing dot on the hostname is accepted and preserved.
    pub fn new(hostname: impl Into<String>, zone_id: impl Into<String>) -> Result<Self> {
        let hostname = hostname.into();
        let zone_id = zone_id.into();

        validate_hostname(&hostname)?;
        if zone_id.trim().is_empty() {
            return Err(Error::config("zone ID cannot be empty"));
        }

        Ok(Self { hostname, zone_id })
    }

    /// The record name, e.g. `home.example.com`
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The provider's zone identifier
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (zone {})", self.hostname, self.zone_id)
    }
}

/// Basic RFC 1035 checks. Not exhaustive, but catches the usual typos.
fn validate_hostname(hostname: &str) -> Result<()> {
    let name = hostname.strip_suffix('.').unwrap_or(hostname);

    if name.is_empty() {
        return Err(Error::config("hostname cannot be empty"));
    }

    if name.len() > 253 {
        return Err(Error::config(format!(
            "hostname too long: {} chars (max 253)",
            name.len()
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "hostname has empty label: '{}'",
                hostname
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "hostname label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        // `*` is allowed only as a whole wildcard label
        if label != "*" && !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::config(format!(
                "hostname label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "hostname label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}
