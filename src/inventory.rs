//! Aggregation run
//!
//! [`Inventory`] is the result of one run: the raw records as fetched, the
//! normalized view derived from them, and how many records were dropped.
//! The caller owns it; nothing is kept globally.

use crate::error::{Error, Result};
use crate::ibm::{acquire_token, ApiKey, IbmClient};
use crate::resource::{
    fetch_all_configs, filter_records, load_snapshot, normalize_all, RawConfigRecord,
    ResourceRecord, ServiceFilter,
};
use std::path::Path;

/// Message shown when a run is started without its inputs
pub const MISSING_INPUT_MESSAGE: &str = "Please provide both an instance id and an API key";

/// Where an inventory came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Fetched live from an aggregator instance
    Live { instance_id: String },
    /// Loaded from a snapshot file
    Snapshot { path: String },
}

#[derive(Debug, Clone)]
pub struct Inventory {
    pub origin: Origin,
    pub raw: Vec<RawConfigRecord>,
    pub records: Vec<ResourceRecord>,
    pub discarded: usize,
}

impl Inventory {
    /// Build an inventory from already-fetched raw records
    pub fn from_raw(origin: Origin, raw: Vec<RawConfigRecord>) -> Self {
        let normalized = normalize_all(&raw);
        Self {
            origin,
            raw,
            records: normalized.records,
            discarded: normalized.discarded,
        }
    }

    /// Run the full pipeline: validate, authenticate, fetch, normalize
    ///
    /// `server_service_name` narrows the listing on the server side.
    pub async fn collect(
        client: &IbmClient,
        api_key: &ApiKey,
        server_service_name: Option<&str>,
    ) -> Result<Self> {
        validate_inputs(api_key, &client.instance_id)?;

        let token = acquire_token(client, api_key).await?;
        let raw = fetch_all_configs(client, &token, server_service_name).await?;

        let inventory = Self::from_raw(
            Origin::Live {
                instance_id: client.instance_id.clone(),
            },
            raw,
        );

        tracing::info!(
            "Inventory ready: {} records ({} discarded)",
            inventory.records.len(),
            inventory.discarded
        );

        Ok(inventory)
    }

    /// Re-derive an inventory from an exported snapshot
    pub fn from_snapshot(path: &Path) -> Result<Self> {
        let raw = load_snapshot(path)?;
        Ok(Self::from_raw(
            Origin::Snapshot {
                path: path.display().to_string(),
            },
            raw,
        ))
    }

    /// Records visible under a filter, in fetch order
    pub fn visible(&self, filter: &ServiceFilter) -> Vec<&ResourceRecord> {
        filter_records(&self.records, filter)
    }

    pub fn is_live(&self) -> bool {
        matches!(self.origin, Origin::Live { .. })
    }
}

/// Reject a run whose credential or instance id is missing
pub fn validate_inputs(api_key: &ApiKey, instance_id: &str) -> Result<()> {
    if api_key.is_blank() || instance_id.trim().is_empty() {
        return Err(Error::Config(MISSING_INPUT_MESSAGE.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_inputs() {
        assert!(validate_inputs(&ApiKey::new("key"), "guid").is_ok());

        let err = validate_inputs(&ApiKey::new(""), "guid").unwrap_err();
        assert_eq!(err.to_string(), MISSING_INPUT_MESSAGE);

        let err = validate_inputs(&ApiKey::new("key"), "  ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_raw_keeps_raw_untouched() {
        let raw = vec![
            RawConfigRecord(json!({
                "about": {"service_name": "is.instance", "config_type": "instance", "resource_name": "vm1", "location": "eu-de"},
                "config": {"resource_id": "crn1", "vpc_id": "vpc1", "created_at": "2024-01-01"}
            })),
            RawConfigRecord(json!({
                "about": {"service_name": "containers-kubernetes", "config_type": "worker"},
                "config": {"id": "w1"}
            })),
            RawConfigRecord(json!({"about": {"service_name": "orphan"}})),
        ];

        let inventory = Inventory::from_raw(
            Origin::Live {
                instance_id: "guid".into(),
            },
            raw.clone(),
        );

        assert_eq!(inventory.raw, raw);
        assert_eq!(inventory.records.len(), 2);
        assert_eq!(inventory.discarded, 1);
        assert!(inventory.is_live());

        let vsis = inventory.visible(&ServiceFilter::Vsi);
        assert_eq!(vsis.len(), 1);
        assert_eq!(vsis[0].name.as_deref(), Some("vm1"));
    }
}
