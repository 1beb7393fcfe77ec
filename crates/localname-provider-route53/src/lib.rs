// # Route 53 DNS Updater
//
// This crate points a single Route 53 record at an address using the
// ChangeResourceRecordSets REST API directly (reqwest + SigV4), without the
// AWS SDK.
//
// ## Behavior
//
// - One signed POST per upsert: a change batch with a single UPSERT
// - `A` for IPv4, `AAAA` for IPv6, one value, configurable TTL (default 60)
// - No retries, no backoff, no change-propagation polling; the sync loop
//   retries on its next tick
//
// ## Security Requirements
//
// - The secret key and session token NEVER appear in logs or Debug output
// - Credentials are read from the standard AWS environment variables
//
// ## API Reference
//
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/{Id}/rrset`
// - Required IAM permission: `route53:ChangeResourceRecordSets`

mod credentials;
mod sigv4;
mod xml;

pub use credentials::Route53Credentials;

use async_trait::async_trait;
use chrono::Utc;
use localname_core::config::UpdaterConfig;
use localname_core::traits::{DEFAULT_RECORD_TTL, DnsUpdater, RecordType};
use localname_core::{Error, Result, SyncTarget, UpdateError};
use reqwest::StatusCode;
use std::net::IpAddr;
use std::time::Duration;

use crate::sigv4::SigningParams;
use crate::xml::ChangeResourceRecordSetsRequest;

/// Route 53 API endpoint (global service)
pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";

/// Route 53 signs in us-east-1 regardless of where the caller runs
const SIGNING_REGION: &str = "us-east-1";
const SIGNING_SERVICE: &str = "route53";

/// Longest error body excerpt carried in an error
const MAX_ERROR_BODY: usize = 256;

/// Route 53 DNS updater
///
/// # Security
///
/// Debug output goes through [`Route53Credentials`]' redacting Debug.
#[derive(Debug, Clone)]
pub struct Route53Updater {
    credentials: Route53Credentials,

    /// Scheme and authority of the API, e.g. `https://route53.amazonaws.com`
    endpoint: reqwest::Url,

    /// TTL written on the record
    ttl: u32,

    /// Change batch comment
    comment: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl Route53Updater {
    /// Create an updater against the public Route 53 endpoint
    pub fn new(credentials: Route53Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("localname/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            endpoint: parse_endpoint(ROUTE53_ENDPOINT)?,
            ttl: DEFAULT_RECORD_TTL,
            comment: None,
            client,
        })
    }

    /// Create an updater using TTL and comment from configuration
    pub fn from_config(credentials: Route53Credentials, config: &UpdaterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(credentials)?
            .with_ttl(config.ttl)
            .with_comment(config.comment.clone()))
    }

    /// Send requests to a different endpoint (testing, proxies)
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = parse_endpoint(endpoint)?;
        Ok(self)
    }

    /// Set the record TTL in seconds
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the change batch comment; an empty comment is omitted
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = (!comment.is_empty()).then_some(comment);
        self
    }

    /// `host[:port]` as sent in the Host header
    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<reqwest::Url> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| Error::config(format!("invalid Route 53 endpoint '{}': {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::config(format!(
            "Route 53 endpoint must be an HTTP(S) URL with a host. Got: {}",
            endpoint
        )));
    }

    Ok(url)
}

/// Accept both `Z123` and `/hostedzone/Z123`
///
/// Hosted zone IDs are ASCII alphanumeric. Anything else would be
/// percent-encoded in the URL and no longer match the signed path.
fn normalize_zone_id(zone_id: &str) -> std::result::Result<&str, UpdateError> {
    let id = zone_id.strip_prefix("/hostedzone/").unwrap_or(zone_id);
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(UpdateError::Encoding(format!(
            "invalid hosted zone ID '{}'",
            zone_id
        )));
    }
    Ok(id)
}

#[async_trait]
impl DnsUpdater for Route53Updater {
    /// Upsert the address record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /2013-04-01/hostedzone/{zone}/rrset
    /// Authorization: AWS4-HMAC-SHA256 ...
    ///
    /// <ChangeResourceRecordSetsRequest>...UPSERT...</ChangeResourceRecordSetsRequest>
    /// ```
    async fn upsert(
        &self,
        ip: IpAddr,
        target: &SyncTarget,
        timeout: Duration,
    ) -> std::result::Result<(), UpdateError> {
        let record_type = RecordType::for_ip(ip);
        let path = format!(
            "/2013-04-01/hostedzone/{}/rrset",
            normalize_zone_id(target.zone_id())?
        );

        let request = ChangeResourceRecordSetsRequest::upsert(
            target.hostname(),
            record_type.as_str(),
            self.ttl,
            ip.to_string(),
            self.comment.clone(),
        );
        let body = quick_xml::se::to_string(&request)
            .map_err(|e| UpdateError::Encoding(e.to_string()))?;

        let host = self.host();
        let signed = sigv4::sign(
            "POST",
            &path,
            "",
            &[("host", &host)],
            body.as_bytes(),
            &SigningParams {
                access_key_id: &self.credentials.access_key_id,
                secret_access_key: &self.credentials.secret_access_key,
                session_token: self.credentials.session_token.as_deref(),
                region: SIGNING_REGION,
                service: SIGNING_SERVICE,
                now: Utc::now(),
            },
        );

        let mut url = self.endpoint.clone();
        url.set_path(&path);

        tracing::debug!(
            "Route53 UPSERT {} {} -> {} (zone {})",
            record_type.as_str(),
            target.hostname(),
            ip,
            target.zone_id()
        );

        let mut builder = self
            .client
            .post(url)
            .timeout(timeout)
            .header("Host", host)
            .header("X-Amz-Date", signed.amz_date)
            .header("Authorization", signed.authorization)
            .header("Content-Type", "application/xml");
        if let Some(token) = signed.security_token {
            builder = builder.header("X-Amz-Security-Token", token);
        }

        let response = builder.body(body).send().await.map_err(|e| {
            if e.is_timeout() {
                UpdateError::Timeout(timeout)
            } else {
                UpdateError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Route53 accepted change for {}", target.hostname());
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(map_error_response(status, &error_text))
    }

    fn updater_name(&self) -> &'static str {
        "route53"
    }
}

/// Map a non-2xx Route 53 response to an [`UpdateError`]
fn map_error_response(status: StatusCode, body: &str) -> UpdateError {
    let (code, message) = xml::parse_error(body)
        .unwrap_or_else(|| ("Unknown".to_string(), truncate(body.trim(), MAX_ERROR_BODY)));

    match status.as_u16() {
        401 | 403 => UpdateError::Authentication(format!("{}: {}", code, message)),
        429 => UpdateError::Throttled(message),
        _ if code == "Throttling" => UpdateError::Throttled(message),
        500..=599 => UpdateError::Unavailable {
            status: status.as_u16(),
            message,
        },
        _ => UpdateError::Rejected {
            status: status.as_u16(),
            code,
            message,
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
