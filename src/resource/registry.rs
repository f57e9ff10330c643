//! View Registry - Load column layouts from JSON
//!
//! Each service filter renders with its own column set. Layouts are
//! embedded at compile time so new columns need no code changes.

use super::filter::ServiceFilter;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded view definitions (compiled into the binary)
const VIEWS_FILE: &str = include_str!("../resources/views.json");

/// Placeholder for values a record does not carry
pub const MISSING: &str = "N/A";

/// How a cell value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CellFormat {
    #[default]
    Plain,
    /// Timestamp shortened to `YYYY-MM-DD`
    Date,
    /// CRN cut after its sixth segment
    Crn,
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    /// Width as a percentage of the table
    pub width: u16,
    #[serde(default)]
    pub format: CellFormat,
}

impl ColumnDef {
    /// Rendered cell for a record's JSON view
    pub fn render(&self, item: &Value) -> String {
        let raw = extract_json_value(item, &self.json_path);
        if raw == MISSING {
            return raw;
        }
        match self.format {
            CellFormat::Plain => raw,
            CellFormat::Date => format_date_short(&raw),
            CellFormat::Crn => shorten_crn(&raw),
        }
    }
}

/// View definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ViewDef {
    pub display_name: String,
    pub columns: Vec<ColumnDef>,
}

/// Root structure of resources/views.json
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    pub views: HashMap<String, ViewDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ViewConfig> = OnceLock::new();

/// Get the view registry (parses the embedded JSON on first access)
pub fn get_registry() -> &'static ViewConfig {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(VIEWS_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded view JSON: {}", e))
    })
}

/// Registry key of the view used for a filter
pub fn view_key(filter: &ServiceFilter) -> &'static str {
    match filter {
        ServiceFilter::Vsi => "vsi",
        ServiceFilter::KubernetesWorker => "kubernetes-worker",
        ServiceFilter::All | ServiceFilter::Service(_) => "default",
    }
}

/// View for a filter, if the registry defines one
pub fn get_view(filter: &ServiceFilter) -> Option<&'static ViewDef> {
    get_registry().views.get(view_key(filter))
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        // Handle array index
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return MISSING.to_string(),
        };
    }

    match current {
        Value::String(s) if s.is_empty() => MISSING.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => MISSING.to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

/// Format timestamp to `YYYY-MM-DD`
fn format_date_short(timestamp: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return parsed.format("%Y-%m-%d").to_string();
    }
    timestamp.chars().take(10).collect()
}

/// Shorten a CRN to its first six segments
pub fn shorten_crn(crn: &str) -> String {
    if crn.is_empty() {
        return MISSING.to_string();
    }
    let parts: Vec<&str> = crn.split(':').collect();
    if parts.len() < 7 {
        return crn.to_string();
    }
    format!("{}...", parts[..6].join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert_eq!(registry.views.len(), 3);
    }

    #[test]
    fn test_every_filter_has_a_view() {
        for filter in ServiceFilter::PRESETS.iter() {
            assert!(get_view(filter).is_some(), "missing view for {}", filter);
        }
        assert!(get_view(&ServiceFilter::Service("cos".into())).is_some());
    }

    #[test]
    fn test_column_widths_fill_the_table() {
        for (key, view) in &get_registry().views {
            let total: u16 = view.columns.iter().map(|c| c.width).sum();
            assert_eq!(total, 100, "view {} widths sum to {}", key, total);
        }
    }

    #[test]
    fn test_vsi_columns() {
        let view = get_view(&ServiceFilter::Vsi).unwrap();
        let headers: Vec<_> = view.columns.iter().map(|c| c.header.as_str()).collect();
        assert_eq!(
            headers,
            vec![
                "Name",
                "Service Name",
                "Region",
                "Created At",
                "Zone",
                "Image Name",
                "Profile",
                "Number of Volumes"
            ]
        );
    }

    #[test]
    fn test_extract_json_value() {
        let item = json!({
            "name": "vm1",
            "about": {"location": "eu-de", "tags": ["a", "b"]},
            "details": {"boot_volume_count": 2, "zone": null},
            "empty": ""
        });

        assert_eq!(extract_json_value(&item, "name"), "vm1");
        assert_eq!(extract_json_value(&item, "about.location"), "eu-de");
        assert_eq!(extract_json_value(&item, "about.tags"), "[2 items]");
        assert_eq!(extract_json_value(&item, "about.tags.1"), "b");
        assert_eq!(extract_json_value(&item, "details.boot_volume_count"), "2");
        assert_eq!(extract_json_value(&item, "details.zone"), MISSING);
        assert_eq!(extract_json_value(&item, "details.missing"), MISSING);
        assert_eq!(extract_json_value(&item, "empty"), MISSING);
        assert_eq!(extract_json_value(&item, "about"), "[object]");
    }

    #[test]
    fn test_date_format() {
        assert_eq!(format_date_short("2024-05-01T10:30:00.000Z"), "2024-05-01");
        assert_eq!(format_date_short("2024-05-01T23:30:00-05:00"), "2024-05-01");
        assert_eq!(format_date_short("2024-05-01"), "2024-05-01");
        assert_eq!(format_date_short("soon"), "soon");
    }

    #[test]
    fn test_date_column_render() {
        let col = ColumnDef {
            header: "Created At".into(),
            json_path: "about.last_config_refresh_time".into(),
            width: 10,
            format: CellFormat::Date,
        };
        let item = json!({"about": {"last_config_refresh_time": "2024-02-03T04:05:06Z"}});
        assert_eq!(col.render(&item), "2024-02-03");
        assert_eq!(col.render(&json!({})), MISSING);
    }

    #[test]
    fn test_shorten_crn() {
        assert_eq!(
            shorten_crn("crn:v1:bluemix:public:is:eu-de:a/123::instance:abc"),
            "crn:v1:bluemix:public:is:eu-de..."
        );
        assert_eq!(shorten_crn("crn:v1:short"), "crn:v1:short");
        assert_eq!(shorten_crn(""), MISSING);
    }
}
