//! HTTP utilities for IBM Cloud REST API calls

use crate::error::HttpFailure;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const JSON: &str = "application/json";

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// HTTP client wrapper for IBM Cloud API calls
///
/// No request timeout is configured: a stalled endpoint blocks the run
/// until the transport gives up.
#[derive(Clone)]
pub struct IbmHttpClient {
    client: Client,
}

impl IbmHttpClient {
    /// Create a new HTTP client
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tibm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make an authenticated GET request and parse the JSON body
    pub async fn get(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<Value, HttpFailure> {
        tracing::debug!("GET {} {:?}", url, query);

        let request = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .query(query);

        send(request, false).await
    }

    /// POST a form-encoded body (no bearer token)
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value, HttpFailure> {
        tracing::debug!("POST {} (form)", url);

        let request = self.client.post(url).header(ACCEPT, JSON).form(form);

        send(request, false).await
    }

    /// POST a JSON body, optionally authenticated
    ///
    /// A success without a body (e.g. `204`) yields `Value::Null`.
    pub async fn post_json(
        &self,
        url: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Value, HttpFailure> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).header(ACCEPT, JSON).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        send(request, true).await
    }
}

async fn send(request: RequestBuilder, allow_empty: bool) -> Result<Value, HttpFailure> {
    let response = request.send().await.map_err(|e| {
        tracing::error!("Request failed to send: {}", e);
        HttpFailure::transport(&e)
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| HttpFailure::status(status.as_u16(), e.to_string()))?;

    if !status.is_success() {
        // Only the sanitized body goes to the log; the caller gets it verbatim
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        return Err(HttpFailure::status(status.as_u16(), body));
    }

    if body.trim().is_empty() {
        if allow_empty {
            return Ok(Value::Null);
        }
        tracing::error!("Empty response body with status {}", status);
        return Err(HttpFailure::status(
            status.as_u16(),
            "invalid JSON response: empty body",
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Undecodable response body: {}", sanitize_for_log(&body));
        HttpFailure::status(status.as_u16(), format!("invalid JSON response: {}", e))
    })
}
