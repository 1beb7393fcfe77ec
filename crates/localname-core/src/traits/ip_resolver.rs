// # IP Resolver Trait
//
// Defines the interface for discovering the host's externally visible IP
// address.
//
// ## Implementations
//
// - HTTP lookup service: `localname-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use localname_core::IpResolver;
// use std::time::Duration;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//
//     let ip = resolver.resolve(Duration::from_secs(5)).await?;
//     println!("public address: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::error::ResolutionError;

/// Trait for IP discovery implementations
///
/// A resolver is a stateless, single-shot lookup. It has no opinion on
/// whether the address changed and does not remember previous results.
///
/// # Rules for implementations
///
/// - Make exactly one attempt per call. Retry policy belongs to the sync
///   loop, whose tick cadence is the retry mechanism.
/// - Honour `timeout` for the whole exchange (connect, response, body).
/// - Return a canonical address: an IPv4-mapped IPv6 literal is returned
///   as IPv4 so that equality matches what the record will hold.
/// - Do not spawn tasks.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Look up the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The validated address
    /// - `Err(ResolutionError)`: Transport failure, timeout, or a response
    ///   that did not contain a single IP literal
    async fn resolve(&self, timeout: Duration) -> Result<IpAddr, ResolutionError>;
}

/// Parse a lookup-service payload into a canonical address
///
/// Surrounding whitespace is ignored. Anything other than a single IP
/// literal is an [`ResolutionError::InvalidPayload`].
pub fn parse_ip_payload(body: &str) -> Result<IpAddr, ResolutionError> {
    let text = body.trim();
    text.parse::<IpAddr>()
        .map(|ip| ip.to_canonical())
        .map_err(|_| ResolutionError::InvalidPayload(truncate_payload(text)))
}

/// Keep error messages bounded when a service returns an HTML page
fn truncate_payload(text: &str) -> String {
    const MAX_PAYLOAD_CHARS: usize = 64;

    if text.chars().count() <= MAX_PAYLOAD_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_PAYLOAD_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn parses_trimmed_literals() {
        assert_eq!(
            parse_ip_payload("  203.0.113.5\n").unwrap(),
            IpAddr::from(Ipv4Addr::new(203, 0, 113, 5))
        );
        assert_eq!(
            parse_ip_payload("2001:db8::1\r\n").unwrap(),
            IpAddr::from("2001:db8::1".parse::<Ipv6Addr>().unwrap())
        );
    }

    #[test]
    fn mapped_ipv4_is_canonicalised() {
        assert_eq!(
            parse_ip_payload("::ffff:203.0.113.5").unwrap(),
            IpAddr::from(Ipv4Addr::new(203, 0, 113, 5))
        );
    }

    #[test]
    fn rejects_empty_and_malformed_payloads() {
        assert_eq!(
            parse_ip_payload(" \n"),
            Err(ResolutionError::InvalidPayload(String::new()))
        );
        assert!(matches!(
            parse_ip_payload("203.0.113"),
            Err(ResolutionError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_ip_payload("203.0.113.5 203.0.113.6"),
            Err(ResolutionError::InvalidPayload(_))
        ));
    }

    #[test]
    fn long_payloads_are_truncated() {
        let html = format!("<html>{}</html>", "x".repeat(500));
        match parse_ip_payload(&html) {
            Err(ResolutionError::InvalidPayload(p)) => {
                assert!(p.ends_with("..."));
                assert_eq!(p.chars().count(), 67);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
