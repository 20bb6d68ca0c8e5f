//! AWS Signature Version 4 request signing for Bedrock.

use bench_core::BenchError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Static AWS credentials used to sign requests.
#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Load credentials from the standard AWS environment variables.
    pub fn from_env() -> Result<Self, BenchError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| BenchError::configuration("AWS_ACCESS_KEY_ID not set"))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| BenchError::configuration("AWS_SECRET_ACCESS_KEY not set"))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

/// Sign a request and return the full header set to attach, including
/// `host`, `x-amz-date`, `x-amz-content-sha256`, and `authorization`.
///
/// BTreeMap keeps headers sorted, which is exactly the canonical ordering
/// SigV4 requires.
pub(crate) fn sign_request(
    credentials: &Credentials,
    method: &str,
    uri: &str,
    region: &str,
    service: &str,
    body: &[u8],
    extra_headers: &[(&str, &str)],
    now: DateTime<Utc>,
) -> Result<BTreeMap<String, String>, BenchError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let parsed = url::Url::parse(uri)
        .map_err(|e| BenchError::configuration(format!("invalid endpoint URL: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| BenchError::configuration("endpoint URL has no host"))?
        .to_string();
    let host = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };
    let path = parsed.path().to_string();

    let payload_hash = hex::encode(sha256(body));

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in extra_headers {
        headers.insert((*name).to_lowercase(), (*value).to_string());
    }
    headers.insert("host".to_string(), host);
    headers.insert("x-amz-date".to_string(), amz_date.clone());
    headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
    if let Some(ref token) = credentials.session_token {
        headers.insert("x-amz-security-token".to_string(), token.clone());
    }

    let signed_headers = headers
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(";");
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    let canonical_request = format!(
        "{method}\n{path}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    );

    let algorithm = "AWS4-HMAC-SHA256";
    let credential_scope = format!("{date_stamp}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "{algorithm}\n{amz_date}\n{credential_scope}\n{}",
        hex::encode(sha256(canonical_request.as_bytes()))
    );

    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "{algorithm} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    );
    headers.insert("authorization".to_string(), authorization);

    Ok(headers)
}

fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        // HMAC accepts keys of any size.
        Err(_) => unreachable!("hmac key length is unrestricted"),
    };
    mac.update(data);
    mac.finalize().into_bytes().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_credentials() -> Credentials {
        Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: None,
        }
    }

    #[test]
    fn test_signature_shape() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let headers = sign_request(
            &test_credentials(),
            "POST",
            "https://bedrock-runtime.us-east-2.amazonaws.com/model/deepseek.v3-v1:0/converse-stream",
            "us-east-2",
            "bedrock",
            b"{}",
            &[("content-type", "application/json")],
            now,
        )
        .unwrap();

        assert_eq!(
            headers.get("host").map(String::as_str),
            Some("bedrock-runtime.us-east-2.amazonaws.com")
        );
        assert_eq!(
            headers.get("x-amz-date").map(String::as_str),
            Some("20240601T120000Z")
        );

        let auth = headers.get("authorization").unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240601/us-east-2/bedrock/aws4_request"));
        assert!(auth.contains("SignedHeaders="));
        assert!(auth.contains("content-type;host;x-amz-content-sha256;x-amz-date"));
        assert!(auth.contains("Signature="));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let sign = || {
            sign_request(
                &test_credentials(),
                "POST",
                "https://bedrock-runtime.us-east-2.amazonaws.com/model/m/converse-stream",
                "us-east-2",
                "bedrock",
                b"body",
                &[],
                now,
            )
            .unwrap()
        };
        assert_eq!(sign(), sign());
    }

    #[test]
    fn test_session_token_is_signed() {
        let mut credentials = test_credentials();
        credentials.session_token = Some("FwoGZXIvYXdzEBc".to_string());

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let headers = sign_request(
            &credentials,
            "POST",
            "https://bedrock-runtime.us-east-2.amazonaws.com/model/m/converse-stream",
            "us-east-2",
            "bedrock",
            b"{}",
            &[],
            now,
        )
        .unwrap();

        assert!(headers.contains_key("x-amz-security-token"));
        let auth = headers.get("authorization").unwrap();
        assert!(auth.contains("x-amz-security-token"));
    }

    #[test]
    fn test_oversized_secret_key_signs() {
        // Secrets longer than the SHA-256 block size still key the HMAC.
        let mut credentials = test_credentials();
        credentials.secret_access_key = "k".repeat(100);

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let headers = sign_request(
            &credentials,
            "POST",
            "https://bedrock-runtime.us-east-2.amazonaws.com/model/m/converse-stream",
            "us-east-2",
            "bedrock",
            b"{}",
            &[],
            now,
        )
        .unwrap();
        assert!(headers.get("authorization").unwrap().contains("Signature="));
    }

    #[test]
    fn test_custom_port_in_host() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let headers = sign_request(
            &test_credentials(),
            "POST",
            "http://localhost:4566/model/m/converse-stream",
            "us-east-1",
            "bedrock",
            b"{}",
            &[],
            now,
        )
        .unwrap();
        assert_eq!(headers.get("host").map(String::as_str), Some("localhost:4566"));
    }
}
