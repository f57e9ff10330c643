//! IBM Cloud IAM Authentication
//!
//! Exchanges an API key for a short-lived bearer token. A token is minted
//! once per aggregation run and dropped with it; nothing is cached or
//! refreshed.

use super::client::IbmClient;
use crate::error::{Error, HttpFailure, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;

/// Grant type for API key exchange
pub const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// IBM Cloud API key
///
/// Never logged: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Bearer token returned by the IAM token endpoint
#[derive(Clone, Deserialize)]
pub struct BearerToken {
    pub access_token: String,
    /// Declared lifetime in seconds
    pub expires_in: u64,
    /// Expiry as unix seconds
    pub expiration: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.access_token
    }

    /// Expiry as a UTC timestamp, if the server sent a sane value
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expiration, 0).single()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("access_token", &"***")
            .field("expires_in", &self.expires_in)
            .field("expiration", &self.expiration)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Exchange an API key for a bearer token
///
/// One request, no retry. Any failure ends the run before pagination.
pub async fn acquire_token(client: &IbmClient, api_key: &ApiKey) -> Result<BearerToken> {
    tracing::info!("Requesting IAM token");

    let url = client.token_url();
    let response = client
        .http
        .post_form(
            &url,
            &[("grant_type", APIKEY_GRANT_TYPE), ("apikey", api_key.expose())],
        )
        .await
        .map_err(Error::Auth)?;

    // The status is not kept past `send`; a decode failure carries none
    let token: BearerToken = serde_json::from_value(response).map_err(|e| {
        Error::Auth(HttpFailure {
            status: None,
            body: format!("invalid token response: {}", e),
        })
    })?;

    match token.expires_at() {
        Some(at) => tracing::info!("IAM token received, expires at {}", at.to_rfc3339()),
        None => tracing::info!(
            "IAM token received, expires in {} seconds",
            token.expires_in
        ),
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }

    #[test]
    fn test_blank_api_key() {
        assert!(ApiKey::new("   ").is_blank());
        assert!(!ApiKey::new("k").is_blank());
    }

    #[test]
    fn test_token_deserializes_from_iam_response() {
        let token: BearerToken = serde_json::from_value(json!({
            "access_token": "eyJ.abc",
            "refresh_token": "not_supported",
            "token_type": "Bearer",
            "expires_in": 3600,
            "expiration": 1_704_070_800
        }))
        .unwrap();

        assert_eq!(token.as_str(), "eyJ.abc");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
        assert_eq!(
            token.expires_at().unwrap().to_rfc3339(),
            "2024-01-01T01:00:00+00:00"
        );
    }

    #[test]
    fn test_token_debug_hides_secret() {
        let token = BearerToken {
            access_token: "secret-token".into(),
            expires_in: 60,
            expiration: 0,
            token_type: None,
            refresh_token: None,
        };
        assert!(!format!("{:?}", token).contains("secret-token"));
    }

    #[test]
    fn test_token_requires_access_token() {
        let result: std::result::Result<BearerToken, _> =
            serde_json::from_value(json!({"expires_in": 3600, "expiration": 1}));
        assert!(result.is_err());
    }
}
