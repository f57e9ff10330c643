//! Resource pipeline
//!
//! Everything between the raw listing endpoint and what the viewer shows.
//!
//! # Architecture
//!
//! - [`fetcher`] - Pages through the aggregator's config listing
//! - [`model`] - Raw and normalized record shapes
//! - [`normalize`] - Maps raw records onto the uniform shape
//! - [`filter`] - Service/type selectors over normalized records
//! - [`export`] - Writes and reads raw snapshots
//! - [`registry`] - Column layouts per selector, loaded from embedded JSON
//!
//! # Example
//!
//! ```ignore
//! use tibm::resource::{fetch_all_configs, filter_records, normalize_all, ServiceFilter};
//!
//! async fn list_vsis(client: &IbmClient, token: &BearerToken) -> tibm::error::Result<usize> {
//!     let raw = fetch_all_configs(client, token, None).await?;
//!     let normalized = normalize_all(&raw);
//!     Ok(filter_records(&normalized.records, &ServiceFilter::Vsi).len())
//! }
//! ```

pub mod export;
pub mod fetcher;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod registry;

pub use export::{default_export_path, export_to_file, export_to_url, load_snapshot};
pub use fetcher::{fetch_all_configs, fetch_configs_page, ConfigPage, PAGE_SIZE};
pub use filter::{filter_records, ServiceFilter};
pub use model::{RawConfigRecord, ResourceKind, ResourceRecord};
pub use normalize::{normalize, normalize_all, Normalized};
pub use registry::{extract_json_value, get_view, ColumnDef, ViewDef};
