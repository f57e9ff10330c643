//! Record normalization
//!
//! Maps raw aggregator records onto [`ResourceRecord`]. Records without an
//! `about` or `config` object are dropped, not reported as errors.

use super::model::{
    RawConfigRecord, ResourceKind, ResourceRecord, VSI_CONFIG_TYPE, VSI_SERVICE_NAME,
    WORKER_CONFIG_TYPE,
};
use serde_json::Value;

/// Result of normalizing a whole page set
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<ResourceRecord>,
    /// Raw records dropped for lacking `about` or `config`
    pub discarded: usize,
}

/// Normalize one raw record, or `None` if it is structurally unusable
pub fn normalize(raw: &RawConfigRecord) -> Option<ResourceRecord> {
    let about = raw.about().filter(|v| v.is_object())?;
    let config = raw.config().filter(|v| v.is_object())?;
    let config_v2 = raw.config_v2();

    Some(ResourceRecord {
        name: str_field(about, "resource_name"),
        resource_id: str_field(config, "resource_id"),
        resource_group_name: str_field(about, "location"),
        region: str_field(config, "vpc_id"),
        created_at: str_field(config, "created_at"),
        crn: str_field(config, "resource_id"),
        details: classify(about, config, config_v2),
        about: about.clone(),
        config: config.clone(),
        config_v2: config_v2.cloned(),
    })
}

/// Normalize a list, preserving order
pub fn normalize_all(raw: &[RawConfigRecord]) -> Normalized {
    let records: Vec<ResourceRecord> = raw.iter().filter_map(normalize).collect();
    let discarded = raw.len() - records.len();

    if discarded > 0 {
        tracing::warn!(
            "Discarded {} of {} config records without about/config",
            discarded,
            raw.len()
        );
    }

    Normalized { records, discarded }
}

/// Pick the tag for a record from `(service_name, config_type)`
fn classify(about: &Value, config: &Value, config_v2: Option<&Value>) -> ResourceKind {
    let service_name = about.get("service_name").and_then(Value::as_str);
    let config_type = about.get("config_type").and_then(Value::as_str);

    match (service_name, config_type) {
        (Some(VSI_SERVICE_NAME), Some(VSI_CONFIG_TYPE)) => ResourceKind::Vsi {
            zone: config_v2.and_then(|v| str_field(v, "zone")),
            image_name: str_field(config, "vm_image_name"),
            profile: config_v2.and_then(|v| str_field(v, "profile")),
            boot_volume_count: config_v2
                .map(|v| array_len(v, "boot_volume"))
                .unwrap_or(0),
        },
        (_, Some(WORKER_CONFIG_TYPE)) => ResourceKind::KubernetesWorker {
            worker_id: str_field(config, "id"),
            flavor: str_field(config, "flavor"),
            kube_version: nested_str(config, &["kubeVersion", "actual"]),
            operating_system: nested_str(config, &["lifecycle", "actualOperatingSystem"]),
            cluster_type: str_field(about, "type"),
        },
        (service_name, config_type) => ResourceKind::Other {
            service_name: service_name.map(str::to_string),
            config_type: config_type.map(str::to_string),
        },
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn nested_str(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |current, part| current.get(part))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Length of an array-shaped field; anything else counts as zero
fn array_len(value: &Value, key: &str) -> usize {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0)
}
