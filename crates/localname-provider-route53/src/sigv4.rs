//! AWS Signature Version 4 request signing
//!
//! Only what Route 53 needs: header-based auth over a single request with a
//! fully buffered payload. The clock is a parameter so signatures are
//! reproducible.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Who is signing, and for what scope
pub(crate) struct SigningParams<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub session_token: Option<&'a str>,
    pub region: &'a str,
    pub service: &'a str,
    pub now: DateTime<Utc>,
}

/// Headers to attach to the outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

/// Sign one request
///
/// `headers` must contain `host`; `x-amz-date` and, when a session token is
/// present, `x-amz-security-token` are added and signed here.
pub(crate) fn sign(
    method: &str,
    uri: &str,
    query: &str,
    headers: &[(&str, &str)],
    payload: &[u8],
    params: &SigningParams<'_>,
) -> SignedHeaders {
    let amz_date = params.now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = params.now.format("%Y%m%d").to_string();

    let mut all: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
        .collect();
    all.push(("x-amz-date".to_string(), amz_date.clone()));
    if let Some(token) = params.session_token {
        all.push(("x-amz-security-token".to_string(), token.to_string()));
    }
    all.sort();

    let signed_headers = all
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let canonical_headers: String = all.iter().map(|(k, v)| format!("{}:{}\n", k, v)).collect();

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        uri,
        query,
        canonical_headers,
        signed_headers,
        hex::encode(Sha256::digest(payload))
    );

    let scope = format!(
        "{}/{}/{}/aws4_request",
        date_stamp, params.region, params.service
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = derive_signing_key(
        params.secret_access_key,
        &date_stamp,
        params.region,
        params.service,
    );
    let signature = hex::encode(hmac_sha256(&key, &string_to_sign));

    SignedHeaders {
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, params.access_key_id, scope, signed_headers, signature
        ),
        amz_date,
        security_token: params.session_token.map(str::to_string),
    }
}

pub(crate) fn derive_signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_access_key).as_bytes(), date_stamp);
    let k_region = hmac_sha256(&k_date, region);
    let k_service = hmac_sha256(&k_region, service);
    hmac_sha256(&k_service, "aws4_request")
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
