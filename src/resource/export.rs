//! Snapshot export and import
//!
//! A snapshot is the raw, pre-normalization dataset wrapped as
//! `{"configs": [...]}`, the same shape the listing endpoint returns.

use super::model::RawConfigRecord;
use crate::error::{Error, Result};
use crate::ibm::http::IbmHttpClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    configs: &'a [RawConfigRecord],
}

#[derive(Deserialize)]
struct SnapshotOwned {
    configs: Vec<RawConfigRecord>,
}

/// Serialize raw records as a pretty-printed snapshot document
pub fn snapshot_json(raw: &[RawConfigRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&SnapshotRef { configs: raw })
}

/// Write a snapshot to a local file
pub fn export_to_file(raw: &[RawConfigRecord], path: &Path) -> Result<()> {
    let write_err = |source: std::io::Error| Error::ExportWrite {
        path: path.to_path_buf(),
        source,
    };

    let content = snapshot_json(raw).map_err(|e| write_err(e.into()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, content).map_err(write_err)?;

    tracing::info!("Exported {} config records to {:?}", raw.len(), path);
    Ok(())
}

/// POST a snapshot to a remote persistence endpoint
pub async fn export_to_url(http: &IbmHttpClient, raw: &[RawConfigRecord], url: &str) -> Result<()> {
    let body = serde_json::to_value(SnapshotRef { configs: raw })
        .map_err(|e| Error::Config(format!("Failed to serialize snapshot: {}", e)))?;

    http.post_json(url, None, &body)
        .await
        .map_err(Error::ExportPost)?;

    tracing::info!("Posted {} config records to {}", raw.len(), url);
    Ok(())
}

/// Read a snapshot previously written by [`export_to_file`]
pub fn load_snapshot(path: &Path) -> Result<Vec<RawConfigRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Snapshot {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let snapshot: SnapshotOwned = serde_json::from_str(&content).map_err(|e| Error::Snapshot {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        "Loaded {} config records from {:?}",
        snapshot.configs.len(),
        path
    );

    Ok(snapshot.configs)
}

/// Timestamped snapshot file name inside `dir`
pub fn default_export_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("configs-{}.json", now.format("%Y%m%dT%H%M%SZ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Vec<RawConfigRecord> {
        vec![
            RawConfigRecord(json!({"about": {"resource_name": "vm1"}, "config": {"resource_id": "crn1"}})),
            RawConfigRecord(json!({"about": {"resource_name": "broken"}})),
        ]
    }

    #[test]
    fn test_snapshot_keeps_invalid_records() {
        let json = snapshot_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["configs"].as_array().unwrap().len(), 2);
        assert_eq!(value["configs"][1]["about"]["resource_name"], "broken");
    }

    #[test]
    fn test_snapshot_is_indented_with_two_spaces() {
        let json = snapshot_json(&sample()).unwrap();
        assert!(json.starts_with("{\n  \"configs\": ["));
    }

    #[test]
    fn test_file_export_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");

        export_to_file(&sample(), &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_invalid_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_snapshot(&path).unwrap_err();
        assert!(matches!(err, Error::Snapshot { .. }));
        assert!(err.to_string().starts_with("Invalid JSON file format"));
    }

    #[test]
    fn test_snapshot_without_configs_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(&path, r#"{"items": []}"#).unwrap();

        assert!(load_snapshot(&path).is_err());
    }

    #[test]
    fn test_missing_snapshot_file() {
        let err = load_snapshot(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Snapshot { .. }));
    }

    #[test]
    fn test_default_export_path() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let path = default_export_path(Path::new("/tmp/out"), now);
        assert_eq!(path, PathBuf::from("/tmp/out/configs-20240305T140709Z.json"));
    }
}
