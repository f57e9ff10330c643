//! Configuration Management
//!
//! Handles persistent configuration storage for tibm. The API key is never
//! part of it.

use crate::error::Result;
use crate::ibm::client::{aggregator_url_for_region, Endpoints, DEFAULT_IAM_URL, DEFAULT_REGION};
use crate::resource::ServiceFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Last used aggregator instance id
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Aggregator region
    #[serde(default)]
    pub region: Option<String>,
    /// IAM endpoint override
    #[serde(default)]
    pub iam_url: Option<String>,
    /// Aggregator endpoint override (takes precedence over region)
    #[serde(default)]
    pub aggregator_url: Option<String>,
    /// Last selected service filter
    #[serde(default)]
    pub last_filter: Option<String>,
    /// Directory snapshots are exported to from the viewer
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tibm").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; unreadable or invalid files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective instance id (CLI > config)
    pub fn effective_instance_id(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.instance_id.clone())
            .unwrap_or_default()
    }

    /// Get effective region (CLI > config > default)
    pub fn effective_region(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get effective filter (CLI > config > all)
    pub fn effective_filter(&self, cli: Option<&str>) -> ServiceFilter {
        cli.or(self.last_filter.as_deref())
            .map(|s| s.parse::<ServiceFilter>().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Resolve endpoints (explicit URL > region-derived URL)
    pub fn effective_endpoints(
        &self,
        cli_iam_url: Option<&str>,
        cli_aggregator_url: Option<&str>,
        cli_region: Option<&str>,
    ) -> Result<Endpoints> {
        let iam_url = cli_iam_url
            .or(self.iam_url.as_deref())
            .unwrap_or(DEFAULT_IAM_URL);

        let aggregator_url = match cli_aggregator_url.or(self.aggregator_url.as_deref()) {
            Some(url) => url.to_string(),
            None => aggregator_url_for_region(&self.effective_region(cli_region)),
        };

        Endpoints::new(iam_url, &aggregator_url)
    }

    /// Get export directory (config > current directory)
    pub fn effective_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Remember the instance id, region and filter of a successful run
    pub fn remember_run(&mut self, instance_id: &str, region: &str, filter: &ServiceFilter) {
        self.instance_id = Some(instance_id.to_string());
        self.region = Some(region.to_string());
        self.last_filter = Some(filter.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_wins_over_config() {
        let config = Config {
            instance_id: Some("saved".into()),
            region: Some("us-south".into()),
            ..Default::default()
        };

        assert_eq!(config.effective_instance_id(Some("cli")), "cli");
        assert_eq!(config.effective_instance_id(None), "saved");
        assert_eq!(config.effective_region(Some("eu-gb")), "eu-gb");
        assert_eq!(config.effective_region(None), "us-south");
        assert_eq!(Config::default().effective_region(None), DEFAULT_REGION);
        assert_eq!(Config::default().effective_instance_id(None), "");
    }

    #[test]
    fn test_effective_filter() {
        let config = Config {
            last_filter: Some("vsi".into()),
            ..Default::default()
        };
        assert_eq!(config.effective_filter(None), ServiceFilter::Vsi);
        assert_eq!(
            config.effective_filter(Some("kubernetes-worker")),
            ServiceFilter::KubernetesWorker
        );
        assert_eq!(Config::default().effective_filter(None), ServiceFilter::All);
    }

    #[test]
    fn test_endpoints_from_region_and_overrides() {
        let config = Config {
            region: Some("us-east".into()),
            ..Default::default()
        };
        let endpoints = config.effective_endpoints(None, None, None).unwrap();
        assert_eq!(
            endpoints.aggregator_url(),
            "https://us-east.apprapp.cloud.ibm.com/apprapp/config_aggregator/v1"
        );

        let endpoints = config
            .effective_endpoints(Some("http://localhost:1"), Some("http://localhost:2/v1"), None)
            .unwrap();
        assert_eq!(endpoints.iam_url(), "http://localhost:1");
        assert_eq!(endpoints.aggregator_url(), "http://localhost:2/v1");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tibm").join("config.json");

        let mut config = Config::default();
        config.remember_run("guid-1", "eu-de", &ServiceFilter::Vsi);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
        assert!(!std::fs::read_to_string(&path).unwrap().contains("apikey"));
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }
}
