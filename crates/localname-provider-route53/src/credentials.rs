//! AWS credentials for Route 53

use localname_core::{Error, Result};

/// Static AWS credentials
///
/// # Security
///
/// The Debug implementation does NOT expose the secret key or session token.
#[derive(Clone)]
pub struct Route53Credentials {
    pub access_key_id: String,

    /// ⚠️ NEVER log this value
    pub secret_access_key: String,

    /// Set when using temporary (STS) credentials
    pub session_token: Option<String>,
}

impl Route53Credentials {
    /// Create credentials, rejecting empty keys
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Result<Self> {
        let creds = Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.filter(|t| !t.is_empty()),
        };

        if creds.access_key_id.is_empty() {
            return Err(Error::config("AWS access key ID cannot be empty"));
        }
        if creds.secret_access_key.is_empty() {
            return Err(Error::config("AWS secret access key cannot be empty"));
        }

        Ok(creds)
    }

    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN` from the environment
    pub fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| Error::config("AWS_ACCESS_KEY_ID environment variable not set"))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| Error::config("AWS_SECRET_ACCESS_KEY environment variable not set"))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Self::new(access_key_id, secret_access_key, session_token)
    }
}

impl std::fmt::Debug for Route53Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}
