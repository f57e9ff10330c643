//! Config Fetcher
//!
//! Cursor-based pagination over the aggregator's config listing endpoint.

use super::model::RawConfigRecord;
use crate::error::{Error, Result};
use crate::ibm::{BearerToken, IbmClient};
use serde_json::Value;

/// Records requested per page
pub const PAGE_SIZE: u32 = 100;

/// One page of configs
#[derive(Debug, Clone, Default)]
pub struct ConfigPage {
    pub items: Vec<RawConfigRecord>,
    /// Cursor for the next page; `None` on the last page
    pub next_start: Option<String>,
}

/// Fetch every page and return the records in page order
///
/// Pages are requested one at a time. The first failing page aborts the
/// whole fetch and nothing gathered so far is returned.
pub async fn fetch_all_configs(
    client: &IbmClient,
    token: &BearerToken,
    service_name: Option<&str>,
) -> Result<Vec<RawConfigRecord>> {
    let mut all_items = Vec::new();
    let mut start: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch_configs_page(client, token, service_name, start.as_deref()).await?;
        pages += 1;
        all_items.extend(page.items);

        match page.next_start {
            Some(next) => start = Some(next),
            None => break,
        }
    }

    tracing::info!(
        "Fetched {} config records in {} page(s)",
        all_items.len(),
        pages
    );

    Ok(all_items)
}

/// Fetch one page of configs
pub async fn fetch_configs_page(
    client: &IbmClient,
    token: &BearerToken,
    service_name: Option<&str>,
    start: Option<&str>,
) -> Result<ConfigPage> {
    let mut query: Vec<(&str, String)> = Vec::with_capacity(3);
    if let Some(service_name) = service_name {
        query.push(("service_name", service_name.to_string()));
    }
    query.push(("limit", PAGE_SIZE.to_string()));
    if let Some(start) = start {
        query.push(("start", start.to_string()));
    }

    let response = client
        .http
        .get(&client.configs_url(), token.as_str(), &query)
        .await
        .map_err(Error::Fetch)?;

    Ok(parse_page(response))
}

/// Split a listing response into records and the next cursor
fn parse_page(response: Value) -> ConfigPage {
    let next_start = response
        .get("next")
        .and_then(|v| v.get("start"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let items = match response {
        Value::Object(mut map) => match map.remove("configs") {
            Some(Value::Array(items)) => items.into_iter().map(RawConfigRecord).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    ConfigPage { items, next_start }
}
