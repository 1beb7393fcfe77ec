// # HTTP IP Resolver
//
// This crate provides an HTTP-based IP resolver for localname.
//
// ## Protocol
//
// The service is expected to answer a plain GET with the caller's public
// address as the response body, optionally surrounded by whitespace
// (e.g., api.ipify.org, icanhazip.com, or the bundled localname-echo).
//
// ## Behavior
//
// One request per call, bounded by the caller's deadline. No caching and no
// retries: the sync loop decides when to ask again.

use localname_core::config::ResolverConfig;
use localname_core::traits::{IpResolver, parse_ip_payload};
use localname_core::{Error, ResolutionError, Result};

use std::net::IpAddr;
use std::time::Duration;

pub use localname_core::config::DEFAULT_IP_SERVICE_URL;

/// Resolves the public IP by asking an HTTP echo service
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL to fetch the address from
    url: reqwest::Url,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a new HTTP IP resolver
    ///
    /// # Parameters
    ///
    /// - `url`: service URL (e.g., "https://api.ipify.org")
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is not an absolute HTTP(S) URL
    /// or the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::config(format!("invalid IP service URL '{}': {}", url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::config(format!(
                "IP service URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("localname/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// Create from resolver configuration
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        Self::new(&config.url)
    }

    /// The service URL
    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self, timeout: Duration) -> std::result::Result<IpAddr, ResolutionError> {
        tracing::debug!("Requesting external IP from {}", self.url);

        let response = self
            .client
            .get(self.url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ResolutionError::Timeout(timeout)
            } else {
                ResolutionError::Body(e.to_string())
            }
        })?;

        parse_ip_payload(&body)
    }
}

fn map_transport(err: reqwest::Error, timeout: Duration) -> ResolutionError {
    if err.is_timeout() {
        ResolutionError::Timeout(timeout)
    } else {
        ResolutionError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn serve(template: ResponseTemplate) -> (MockServer, HttpIpResolver) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(template)
            .mount(&server)
            .await;

        let resolver = HttpIpResolver::new(&format!("{}/ip", server.uri())).unwrap();
        (server, resolver)
    }

    #[tokio::test]
    async fn parses_trimmed_body() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_string("  203.0.113.5\n")).await;

        let ip = resolver.resolve(TIMEOUT).await.unwrap();
        assert_eq!(ip, IpAddr::from([203, 0, 113, 5]));
    }

    #[tokio::test]
    async fn parses_ipv6_body() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_string("2001:db8::1\n")).await;

        let ip = resolver.resolve(TIMEOUT).await.unwrap();
        assert_eq!(ip, "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn mapped_ipv4_is_canonicalised() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_string("::ffff:203.0.113.5")).await;

        let ip = resolver.resolve(TIMEOUT).await.unwrap();
        assert_eq!(ip, IpAddr::from([203, 0, 113, 5]));
    }

    #[tokio::test]
    async fn non_ip_body_is_invalid_payload() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(200).set_body_string("<html>hello</html>")).await;

        let err = resolver.resolve(TIMEOUT).await.unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidPayload(_)));
        assert!(err.to_string().contains("no IP returned from external service"));
    }

    #[tokio::test]
    async fn empty_body_is_invalid_payload() {
        let (_server, resolver) = serve(ResponseTemplate::new(200)).await;

        let err = resolver.resolve(TIMEOUT).await.unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn error_status_is_rejected() {
        let (_server, resolver) =
            serve(ResponseTemplate::new(500).set_body_string("203.0.113.5")).await;

        let err = resolver.resolve(TIMEOUT).await.unwrap_err();
        assert_eq!(err, ResolutionError::Status(500));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let (_server, resolver) = serve(
            ResponseTemplate::new(200)
                .set_body_string("203.0.113.5")
                .set_delay(Duration::from_secs(2)),
        )
        .await;

        let deadline = Duration::from_millis(100);
        let err = resolver.resolve(deadline).await.unwrap_err();
        assert_eq!(err, ResolutionError::Timeout(deadline));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let server = MockServer::start().await;
        let url = format!("{}/ip", server.uri());
        drop(server);

        let resolver = HttpIpResolver::new(&url).unwrap();
        let err = resolver.resolve(TIMEOUT).await.unwrap_err();
        assert!(matches!(err, ResolutionError::Transport(_)));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(HttpIpResolver::new("ftp://example.com/ip").is_err());
        assert!(HttpIpResolver::new("not a url").is_err());
        assert!(HttpIpResolver::new(DEFAULT_IP_SERVICE_URL).is_ok());
    }
}
