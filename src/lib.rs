//! tibm - IBM Cloud configuration aggregator inventory
//!
//! Authenticates with an API key, pages through an aggregator instance's
//! config records, normalizes them, and filters them by resource type.

pub mod config;
pub mod error;
pub mod ibm;
pub mod inventory;
pub mod resource;

/// Version injected at compile time via TIBM_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TIBM_VERSION") {
    Some(v) => v,
    None => "dev",
};
