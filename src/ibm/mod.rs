//! IBM Cloud API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - API key to bearer token exchange against IAM
//! - [`client`] - Client bundling endpoints and the aggregator instance id
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use tibm::ibm::{acquire_token, ApiKey, Endpoints, IbmClient};
//!
//! async fn example() -> tibm::error::Result<()> {
//!     let client = IbmClient::new(Endpoints::for_region("eu-de")?, "instance-guid")?;
//!     let token = acquire_token(&client, &ApiKey::new("my-api-key")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

pub use auth::{acquire_token, ApiKey, BearerToken};
pub use client::{Endpoints, IbmClient};
