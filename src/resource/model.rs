//! Record shapes
//!
//! Raw records are kept exactly as the aggregator returned them so that an
//! export round-trips. Normalized records are derived from them and carry a
//! tag describing which kind of resource they are.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Service name the aggregator uses for virtual server instances
pub const VSI_SERVICE_NAME: &str = "is.instance";
/// Config type of a VSI record
pub const VSI_CONFIG_TYPE: &str = "instance";
/// Config type of a Kubernetes worker record
pub const WORKER_CONFIG_TYPE: &str = "worker";

/// One config record in the aggregator's native shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawConfigRecord(pub Value);

impl RawConfigRecord {
    pub fn about(&self) -> Option<&Value> {
        self.0.get("about").filter(|v| !v.is_null())
    }

    pub fn config(&self) -> Option<&Value> {
        self.0.get("config").filter(|v| !v.is_null())
    }

    pub fn config_v2(&self) -> Option<&Value> {
        self.0.get("config_v2").filter(|v| !v.is_null())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawConfigRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Type-specific attributes, keyed by `(about.service_name, about.config_type)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceKind {
    /// (`is.instance`, `instance`)
    Vsi {
        zone: Option<String>,
        image_name: Option<String>,
        profile: Option<String>,
        boot_volume_count: usize,
    },
    /// (any, `worker`)
    KubernetesWorker {
        worker_id: Option<String>,
        flavor: Option<String>,
        kube_version: Option<String>,
        operating_system: Option<String>,
        cluster_type: Option<String>,
    },
    Other {
        service_name: Option<String>,
        config_type: Option<String>,
    },
}

impl ResourceKind {
    pub fn is_vsi(&self) -> bool {
        matches!(self, ResourceKind::Vsi { .. })
    }

    pub fn is_kubernetes_worker(&self) -> bool {
        matches!(self, ResourceKind::KubernetesWorker { .. })
    }
}

/// Uniform record derived from a [`RawConfigRecord`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRecord {
    pub name: Option<String>,
    pub resource_id: Option<String>,
    pub resource_group_name: Option<String>,
    pub region: Option<String>,
    pub created_at: Option<String>,
    pub crn: Option<String>,
    pub details: ResourceKind,
    pub about: Value,
    pub config: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_v2: Option<Value>,
}

impl ResourceRecord {
    pub fn service_name(&self) -> Option<&str> {
        self.about.get("service_name").and_then(Value::as_str)
    }

    pub fn config_type(&self) -> Option<&str> {
        self.about.get("config_type").and_then(Value::as_str)
    }

    /// JSON view used by column lookups and the describe pane
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_substructures_count_as_missing() {
        let raw = RawConfigRecord(json!({"about": null, "config": {"resource_id": "x"}}));
        assert!(raw.about().is_none());
        assert!(raw.config().is_some());
        assert!(raw.config_v2().is_none());
    }

    #[test]
    fn test_raw_record_serializes_verbatim() {
        let value = json!({"about": {"service_name": "cos"}, "extra": [1, 2]});
        let raw = RawConfigRecord::from(value.clone());
        assert_eq!(serde_json::to_value(&raw).unwrap(), value);
    }

    #[test]
    fn test_kind_serializes_with_tag() {
        let kind = ResourceKind::Vsi {
            zone: Some("eu-de-1".into()),
            image_name: None,
            profile: None,
            boot_volume_count: 2,
        };
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(value["kind"], "vsi");
        assert_eq!(value["boot_volume_count"], 2);
    }
}
