//! IBM Cloud Client
//!
//! Bundles the HTTP client with the endpoints and the aggregator instance
//! a run talks to.

use super::http::IbmHttpClient;
use crate::error::{Error, Result};
use url::Url;

/// Default IAM endpoint
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

/// Default region of the configuration aggregator
pub const DEFAULT_REGION: &str = "eu-de";

/// Base URLs used by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    iam_url: String,
    aggregator_url: String,
}

impl Endpoints {
    /// Validate and normalize both base URLs
    pub fn new(iam_url: &str, aggregator_url: &str) -> Result<Self> {
        Ok(Self {
            iam_url: validate_base_url("IAM", iam_url)?,
            aggregator_url: validate_base_url("config aggregator", aggregator_url)?,
        })
    }

    /// Public IBM Cloud endpoints for a region
    pub fn for_region(region: &str) -> Result<Self> {
        Self::new(DEFAULT_IAM_URL, &aggregator_url_for_region(region))
    }

    pub fn iam_url(&self) -> &str {
        &self.iam_url
    }

    pub fn aggregator_url(&self) -> &str {
        &self.aggregator_url
    }
}

/// Build the config aggregator base URL for a region
pub fn aggregator_url_for_region(region: &str) -> String {
    format!(
        "https://{}.apprapp.cloud.ibm.com/apprapp/config_aggregator/v1",
        region
    )
}

fn validate_base_url(label: &str, raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("Invalid {} URL '{}': {}", label, raw, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "Invalid {} URL '{}': unsupported scheme",
            label, raw
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Main IBM Cloud client
#[derive(Clone)]
pub struct IbmClient {
    pub http: IbmHttpClient,
    pub endpoints: Endpoints,
    pub instance_id: String,
}

impl IbmClient {
    /// Create a new client for an aggregator instance
    pub fn new(endpoints: Endpoints, instance_id: &str) -> Result<Self> {
        let http = IbmHttpClient::new()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoints,
            instance_id: instance_id.trim().to_string(),
        })
    }

    /// IAM token exchange URL
    pub fn token_url(&self) -> String {
        format!("{}/identity/token", self.endpoints.iam_url())
    }

    /// Config listing URL for the current instance
    pub fn configs_url(&self) -> String {
        format!(
            "{}/instances/{}/configs",
            self.endpoints.aggregator_url(),
            urlencoding::encode(&self.instance_id)
        )
    }
}
