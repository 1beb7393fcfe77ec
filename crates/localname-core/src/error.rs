//! Error types for the localname system
//!
//! The taxonomy separates the two external calls from the startup phase
//! they may occur in:
//!
//! - [`ResolutionError`]: IP discovery failed (transport or payload)
//! - [`UpdateError`]: the DNS provider call failed
//! - [`BootstrapError`]: either of the above, raised before monitoring began
//!
//! Resolution and update errors are retryable once monitoring is running.
//! A bootstrap error is always returned to the caller of `start`.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for localname operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to discover the host's public IP address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The request could not be sent or no response arrived
    #[error("could not make request: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("IP service returned HTTP status {0}")]
    Status(u16),

    /// No response within the deadline
    #[error("IP service did not respond within {0:?}")]
    Timeout(Duration),

    /// The response body could not be read
    #[error("could not read response body: {0}")]
    Body(String),

    /// The service responded but the payload was not an IP address
    #[error("no IP returned from external service (payload: {0:?})")]
    InvalidPayload(String),
}

/// Failure to upsert the DNS record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// The request could not be sent or no response arrived
    #[error("DNS provider request failed: {0}")]
    Transport(String),

    /// No response within the deadline
    #[error("DNS provider did not respond within {0:?}")]
    Timeout(Duration),

    /// Credentials were missing, invalid, or lacked permission
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The provider is rate limiting requests
    #[error("throttled by DNS provider: {0}")]
    Throttled(String),

    /// The provider reported a server-side failure
    #[error("DNS provider unavailable (status {status}): {message}")]
    Unavailable {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider message
        message: String,
    },

    /// The provider rejected the change
    #[error("unable to update record set (status {status}, code {code}): {message}")]
    Rejected {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider error code
        code: String,
        /// Provider message
        message: String,
    },

    /// The request body could not be built
    #[error("could not encode request: {0}")]
    Encoding(String),
}

/// Which bootstrap step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// The initial IP lookup
    Resolution,
    /// The initial DNS push
    Update,
}

/// A failure before the monitoring task was started
///
/// When this is returned no background task exists and the DNS record may
/// not reflect the host's address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// IP discovery failed during bootstrap
    #[error("unable to get external IP: {0}")]
    Resolution(#[source] ResolutionError),

    /// The initial DNS update failed
    #[error("unable to update DNS record: {0}")]
    Update(#[source] UpdateError),
}

impl BootstrapError {
    /// The step that failed
    pub fn phase(&self) -> BootstrapPhase {
        match self {
            BootstrapError::Resolution(_) => BootstrapPhase::Resolution,
            BootstrapError::Update(_) => BootstrapPhase::Update,
        }
    }
}

/// Core error type for the localname system
#[derive(Error, Debug)]
pub enum Error {
    /// Startup failed before monitoring began
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error aborted startup
    pub fn is_bootstrap(&self) -> bool {
        matches!(self, Error::Bootstrap(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_error_reports_phase() {
        let err = BootstrapError::Resolution(ResolutionError::Status(502));
        assert_eq!(err.phase(), BootstrapPhase::Resolution);

        let err = BootstrapError::Update(UpdateError::Throttled("slow down".into()));
        assert_eq!(err.phase(), BootstrapPhase::Update);
    }

    #[test]
    fn bootstrap_message_names_failed_step() {
        let err: Error = BootstrapError::Update(UpdateError::Timeout(Duration::from_secs(5))).into();
        let msg = err.to_string();
        assert!(err.is_bootstrap());
        assert!(msg.contains("unable to update DNS record"), "{}", msg);
        assert!(msg.contains("5s"), "{}", msg);
    }

    #[test]
    fn config_error_is_not_bootstrap() {
        let err = Error::config("poll interval must be positive");
        assert!(!err.is_bootstrap());
        assert_eq!(err.to_string(), "Configuration error: poll interval must be positive");
    }
}
