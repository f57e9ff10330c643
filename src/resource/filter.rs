//! Service/type filter over normalized records
//!
//! The aggregator reuses one service name for several record subtypes that
//! differ only by config type, hence the tiered selectors.

use super::model::{ResourceRecord, VSI_SERVICE_NAME};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Record selector
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceFilter {
    #[default]
    All,
    /// `service_name == "is.instance"` and `config_type == "instance"`
    Vsi,
    /// `config_type == "worker"`
    KubernetesWorker,
    /// Exact, case-sensitive service name match
    Service(String),
}

impl ServiceFilter {
    /// Selectors offered for cycling in the viewer
    pub const PRESETS: [ServiceFilter; 3] = [
        ServiceFilter::All,
        ServiceFilter::Vsi,
        ServiceFilter::KubernetesWorker,
    ];

    pub fn matches(&self, record: &ResourceRecord) -> bool {
        match self {
            ServiceFilter::All => true,
            ServiceFilter::Vsi => record.details.is_vsi(),
            ServiceFilter::KubernetesWorker => record.details.is_kubernetes_worker(),
            ServiceFilter::Service(name) => record.service_name() == Some(name.as_str()),
        }
    }

    /// Service name to send as the server-side `service_name` parameter
    ///
    /// Workers are selected by config type under any service, so no single
    /// service name narrows them without losing records.
    pub fn server_service_name(&self) -> Option<&str> {
        match self {
            ServiceFilter::All | ServiceFilter::KubernetesWorker => None,
            ServiceFilter::Vsi => Some(VSI_SERVICE_NAME),
            ServiceFilter::Service(name) => Some(name.as_str()),
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> String {
        match self {
            ServiceFilter::All => "All resources".to_string(),
            ServiceFilter::Vsi => "VSI".to_string(),
            ServiceFilter::KubernetesWorker => "Kubernetes workers".to_string(),
            ServiceFilter::Service(name) => name.clone(),
        }
    }

    /// Next preset, wrapping around; a literal service jumps back to `All`
    pub fn next_preset(&self) -> ServiceFilter {
        match self {
            ServiceFilter::All => ServiceFilter::Vsi,
            ServiceFilter::Vsi => ServiceFilter::KubernetesWorker,
            ServiceFilter::KubernetesWorker | ServiceFilter::Service(_) => ServiceFilter::All,
        }
    }

    pub fn prev_preset(&self) -> ServiceFilter {
        match self {
            ServiceFilter::All | ServiceFilter::Service(_) => ServiceFilter::KubernetesWorker,
            ServiceFilter::Vsi => ServiceFilter::All,
            ServiceFilter::KubernetesWorker => ServiceFilter::Vsi,
        }
    }
}

impl FromStr for ServiceFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => ServiceFilter::All,
            "vsi" => ServiceFilter::Vsi,
            "kubernetes-worker" => ServiceFilter::KubernetesWorker,
            other => ServiceFilter::Service(other.to_string()),
        })
    }
}

impl fmt::Display for ServiceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceFilter::All => f.write_str("all"),
            ServiceFilter::Vsi => f.write_str("vsi"),
            ServiceFilter::KubernetesWorker => f.write_str("kubernetes-worker"),
            ServiceFilter::Service(name) => f.write_str(name),
        }
    }
}

/// Records matching `filter`, in input order
pub fn filter_records<'a>(
    records: &'a [ResourceRecord],
    filter: &ServiceFilter,
) -> Vec<&'a ResourceRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::model::RawConfigRecord;
    use crate::resource::normalize::normalize;
    use serde_json::json;

    fn record(service_name: &str, config_type: &str, name: &str) -> ResourceRecord {
        normalize(&RawConfigRecord(json!({
            "about": {
                "service_name": service_name,
                "config_type": config_type,
                "resource_name": name
            },
            "config": {}
        })))
        .unwrap()
    }

    fn names(records: &[&ResourceRecord]) -> Vec<String> {
        records.iter().map(|r| r.name.clone().unwrap()).collect()
    }

    fn sample() -> Vec<ResourceRecord> {
        vec![
            record("is.instance", "instance", "vm1"),
            record("is.instance", "worker", "wk-under-is"),
            record("containers-kubernetes", "worker", "wk1"),
            record("cloud-object-storage", "bucket", "cos1"),
            record("is.instance", "instance", "vm2"),
        ]
    }

    #[test]
    fn test_all_is_identity() {
        let records = sample();
        let filtered = filter_records(&records, &ServiceFilter::All);
        assert_eq!(
            names(&filtered),
            vec!["vm1", "wk-under-is", "wk1", "cos1", "vm2"]
        );
    }

    #[test]
    fn test_vsi_requires_service_and_config_type() {
        let records = sample();
        let filtered = filter_records(&records, &ServiceFilter::Vsi);
        assert_eq!(names(&filtered), vec!["vm1", "vm2"]);
    }

    #[test]
    fn test_worker_matches_config_type_only() {
        let records = sample();
        let filtered = filter_records(&records, &ServiceFilter::KubernetesWorker);
        assert_eq!(names(&filtered), vec!["wk-under-is", "wk1"]);
    }

    #[test]
    fn test_literal_matches_service_name_only() {
        let records = sample();
        let filtered = filter_records(&records, &"is.instance".parse().unwrap());
        assert_eq!(names(&filtered), vec!["vm1", "wk-under-is", "vm2"]);
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let records = sample();
        let filtered = filter_records(&records, &"IS.INSTANCE".parse().unwrap());
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        for input in ["all", "vsi", "kubernetes-worker", "cloud-object-storage"] {
            let filter: ServiceFilter = input.parse().unwrap();
            assert_eq!(filter.to_string(), input);
        }
        assert_eq!(
            "containers-kubernetes".parse::<ServiceFilter>().unwrap(),
            ServiceFilter::Service("containers-kubernetes".into())
        );
    }

    #[test]
    fn test_preset_cycle() {
        let mut filter = ServiceFilter::All;
        for _ in 0..ServiceFilter::PRESETS.len() {
            filter = filter.next_preset();
        }
        assert_eq!(filter, ServiceFilter::All);
        assert_eq!(ServiceFilter::All.prev_preset(), ServiceFilter::KubernetesWorker);
        assert_eq!(
            ServiceFilter::Service("x".into()).next_preset(),
            ServiceFilter::All
        );
    }

    /// Whatever the server is asked for must still contain every record the
    /// client-side filter would keep
    #[test]
    fn test_server_filter_never_drops_matches() {
        let records = vec![
            record("containers-kubernetes", "worker", "wk1"),
            record("openshift", "worker", "wk2"),
            record("is.instance", "instance", "vm1"),
            record("is.instance", "volume", "vol1"),
        ];

        for filter in ServiceFilter::PRESETS {
            let Some(service) = filter.server_service_name() else {
                continue;
            };
            for r in filter_records(&records, &filter) {
                assert_eq!(r.service_name(), Some(service), "{} lost {:?}", filter, r.name);
            }
        }
    }

    #[test]
    fn test_server_service_name() {
        assert_eq!(ServiceFilter::All.server_service_name(), None);
        assert_eq!(ServiceFilter::Vsi.server_service_name(), Some("is.instance"));
        assert_eq!(ServiceFilter::KubernetesWorker.server_service_name(), None);
        assert_eq!(
            ServiceFilter::Service("cos".into()).server_service_name(),
            Some("cos")
        );
    }
}
