//! Application State
//!
//! Central application state management for the tibm viewer.

use anyhow::Result;
use chrono::Utc;
use crossterm::event::KeyCode;
use serde_json::Value;
use std::ops::Range;
use tibm::config::Config;
use tibm::ibm::{ApiKey, IbmClient};
use tibm::inventory::Inventory;
use tibm::resource::{default_export_path, export_to_file, get_view, ServiceFilter, ViewDef};

/// Default viewport height (will be updated during render based on terminal size)
const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Application modes
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,   // Viewing list
    Help,     // ? help popup
    Describe, // Viewing JSON of the selected record
}

/// What is needed to re-run a live aggregation
#[derive(Clone)]
pub struct LiveSource {
    pub client: IbmClient,
    pub api_key: ApiKey,
    /// Send the filter's service name to the server
    pub server_filter: bool,
}

/// Main application state
pub struct App {
    pub source: Option<LiveSource>,
    pub inventory: Inventory,
    pub region: String,

    // Current selector and the records it lets through (JSON views)
    pub service_filter: ServiceFilter,
    pub items: Vec<Value>,
    pub filtered_items: Vec<Value>,

    // Navigation state
    pub selected: usize,
    pub mode: Mode,
    pub filter_text: String,
    pub filter_active: bool,

    // UI state
    pub loading: bool,
    refresh_pending: bool,
    pub error_message: Option<String>,
    pub status_message: Option<String>,
    pub describe_scroll: usize,

    // Persistent configuration
    pub config: Config,

    // Key press tracking
    pub last_key_press: Option<(KeyCode, std::time::Instant)>,

    // Virtual scrolling
    pub viewport_height: usize,
    pub scroll_offset: usize,
}

impl App {
    pub fn new(
        source: Option<LiveSource>,
        inventory: Inventory,
        region: String,
        service_filter: ServiceFilter,
        config: Config,
    ) -> Self {
        let mut app = Self {
            source,
            inventory,
            region,
            service_filter,
            items: Vec::new(),
            filtered_items: Vec::new(),
            selected: 0,
            mode: Mode::Normal,
            filter_text: String::new(),
            filter_active: false,
            loading: false,
            refresh_pending: false,
            error_message: None,
            status_message: None,
            describe_scroll: 0,
            config,
            last_key_press: None,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            scroll_offset: 0,
        };
        app.rebuild_items();
        app
    }

    // =========================================================================
    // View Definition Access
    // =========================================================================

    pub fn current_view(&self) -> Option<&'static ViewDef> {
        get_view(&self.service_filter)
    }

    /// Title for the current selector, e.g. "Virtual Server Instances"
    pub fn view_title(&self) -> String {
        match (&self.service_filter, self.current_view()) {
            (ServiceFilter::Service(name), _) => name.clone(),
            (_, Some(view)) => view.display_name.clone(),
            (filter, None) => filter.display_name(),
        }
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Recompute the record list for the current selector
    fn rebuild_items(&mut self) {
        self.items = self
            .inventory
            .visible(&self.service_filter)
            .into_iter()
            .map(|r| r.to_value())
            .collect();
        self.selected = 0;
        self.scroll_offset = 0;
        self.apply_filter();
    }

    pub fn set_service_filter(&mut self, filter: ServiceFilter) {
        if filter == self.service_filter {
            return;
        }
        tracing::debug!("Switching filter to {}", filter);
        self.service_filter = filter;
        self.rebuild_items();

        // Records fetched under the old service name may not include the new one's
        if self.source.as_ref().is_some_and(|s| s.server_filter) {
            self.request_refresh();
        }
    }

    pub fn next_service_filter(&mut self) {
        self.set_service_filter(self.service_filter.next_preset());
    }

    pub fn prev_service_filter(&mut self) {
        self.set_service_filter(self.service_filter.prev_preset());
    }

    /// Apply the `/` text search across the visible columns
    pub fn apply_filter(&mut self) {
        let filter = self.filter_text.to_lowercase();

        if filter.is_empty() {
            self.filtered_items = self.items.clone();
        } else {
            let view = self.current_view();
            self.filtered_items = self
                .items
                .iter()
                .filter(|item| match view {
                    Some(view) => view
                        .columns
                        .iter()
                        .any(|col| col.render(item).to_lowercase().contains(&filter)),
                    None => item.to_string().to_lowercase().contains(&filter),
                })
                .cloned()
                .collect();
        }

        if self.selected >= self.filtered_items.len() {
            self.selected = self.filtered_items.len().saturating_sub(1);
        }
        self.scroll_offset = 0;
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        self.apply_filter();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn selected_item(&self) -> Option<&Value> {
        self.filtered_items.get(self.selected)
    }

    pub fn selected_item_json(&self) -> Option<String> {
        self.selected_item()
            .map(|item| serde_json::to_string_pretty(item).unwrap_or_default())
    }

    pub fn describe_line_count(&self) -> usize {
        self.selected_item_json()
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    pub fn next(&mut self) {
        match self.mode {
            Mode::Describe => {
                self.describe_scroll = (self.describe_scroll + 1)
                    .min(self.describe_line_count().saturating_sub(1));
            },
            _ => {
                if !self.filtered_items.is_empty() {
                    self.selected = (self.selected + 1).min(self.filtered_items.len() - 1);
                }
            },
        }
    }

    pub fn previous(&mut self) {
        match self.mode {
            Mode::Describe => {
                self.describe_scroll = self.describe_scroll.saturating_sub(1);
            },
            _ => {
                self.selected = self.selected.saturating_sub(1);
            },
        }
    }

    pub fn go_to_top(&mut self) {
        match self.mode {
            Mode::Describe => self.describe_scroll = 0,
            _ => self.selected = 0,
        }
    }

    pub fn go_to_bottom(&mut self) {
        match self.mode {
            Mode::Describe => {
                self.describe_scroll = self.describe_line_count().saturating_sub(1);
            },
            _ => {
                if !self.filtered_items.is_empty() {
                    self.selected = self.filtered_items.len() - 1;
                }
            },
        }
    }

    pub fn page_down(&mut self, page_size: usize) {
        if !self.filtered_items.is_empty() {
            self.selected = (self.selected + page_size).min(self.filtered_items.len() - 1);
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn enter_describe_mode(&mut self) {
        if self.selected_item().is_some() {
            self.describe_scroll = 0;
            self.mode = Mode::Describe;
        }
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
    }

    // =========================================================================
    // Run Actions
    // =========================================================================

    /// Write the raw dataset to a timestamped file in the export directory
    pub fn export_snapshot(&mut self) {
        let path = default_export_path(&self.config.effective_export_dir(), Utc::now());

        match export_to_file(&self.inventory.raw, &path) {
            Ok(()) => {
                self.error_message = None;
                self.status_message = Some(format!(
                    "Exported {} records to {}",
                    self.inventory.raw.len(),
                    path.display()
                ));
            },
            Err(e) => {
                self.error_message = Some(e.to_string());
            },
        }
    }

    /// Mark a re-run; the loop draws the loading state before performing it
    pub fn request_refresh(&mut self) {
        if self.source.is_none() {
            self.status_message = Some("Snapshot view: nothing to refresh".to_string());
            return;
        }
        self.refresh_pending = true;
        self.loading = true;
        self.error_message = None;
    }

    pub fn needs_refresh(&self) -> bool {
        self.refresh_pending
    }

    /// Re-run the aggregation with the same inputs
    pub async fn refresh(&mut self) -> Result<()> {
        self.refresh_pending = false;
        let Some(source) = self.source.as_ref() else {
            self.loading = false;
            self.status_message = Some("Snapshot view: nothing to refresh".to_string());
            return Ok(());
        };

        let server_service_name = if source.server_filter {
            self.service_filter.server_service_name()
        } else {
            None
        };

        self.loading = true;
        let result =
            Inventory::collect(&source.client, &source.api_key, server_service_name).await;
        self.loading = false;

        match result {
            Ok(inventory) => {
                self.inventory = inventory;
                self.error_message = None;
                self.status_message = Some("All configs loaded successfully!".to_string());
                self.rebuild_items();
            },
            Err(e) => {
                // Keep the previous inventory on screen
                self.error_message = Some(e.to_string());
            },
        }

        Ok(())
    }

    // =========================================================================
    // Virtual Scrolling
    // =========================================================================

    /// Update the viewport height (called from UI during render)
    pub fn update_viewport(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    /// Ensure the selected item is visible in the viewport
    pub fn ensure_visible(&mut self) {
        if self.filtered_items.is_empty() {
            self.scroll_offset = 0;
            return;
        }

        let visible_height = self.viewport_height;
        let margin = 2; // Keep cursor at least this far from edge

        if self.selected < self.scroll_offset + margin {
            self.scroll_offset = self.selected.saturating_sub(margin);
        } else if self.selected >= self.scroll_offset + visible_height.saturating_sub(margin) {
            self.scroll_offset = self
                .selected
                .saturating_sub(visible_height.saturating_sub(margin + 1));
        }

        // Clamp scroll offset to valid range
        let max_offset = self
            .filtered_items
            .len()
            .saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Get the range of visible items based on scroll offset and viewport
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_offset.min(self.filtered_items.len());
        let end = (self.scroll_offset + self.viewport_height).min(self.filtered_items.len());
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tibm::inventory::Origin;
    use tibm::resource::RawConfigRecord;

    fn app_with(records: Vec<Value>) -> App {
        let inventory = Inventory::from_raw(
            Origin::Snapshot {
                path: "test.json".into(),
            },
            records.into_iter().map(RawConfigRecord).collect(),
        );
        let config = Config {
            export_dir: Some(std::env::temp_dir()),
            ..Default::default()
        };
        App::new(None, inventory, "eu-de".into(), ServiceFilter::All, config)
    }

    fn vsi(name: &str) -> Value {
        json!({
            "about": {"service_name": "is.instance", "config_type": "instance", "resource_name": name},
            "config": {}
        })
    }

    fn worker(name: &str) -> Value {
        json!({
            "about": {"service_name": "containers-kubernetes", "config_type": "worker", "resource_name": name},
            "config": {"id": name}
        })
    }

    #[test]
    fn test_service_filter_rebuilds_items() {
        let mut app = app_with(vec![vsi("vm1"), worker("w1"), vsi("vm2")]);
        assert_eq!(app.items.len(), 3);

        app.service_filter = ServiceFilter::Vsi;
        app.rebuild_items();
        assert_eq!(app.filtered_items.len(), 2);
        assert_eq!(app.filtered_items[1]["name"], "vm2");

        app.service_filter = ServiceFilter::KubernetesWorker;
        app.rebuild_items();
        assert_eq!(app.filtered_items.len(), 1);
    }

    #[test]
    fn test_text_search_narrows_and_clears() {
        let mut app = app_with(vec![vsi("web-1"), vsi("db-1"), vsi("web-2")]);
        app.filter_text = "web".into();
        app.apply_filter();
        assert_eq!(app.filtered_items.len(), 2);

        app.clear_filter();
        assert_eq!(app.filtered_items.len(), 3);
    }

    #[test]
    fn test_selection_clamped_after_search() {
        let mut app = app_with(vec![vsi("a"), vsi("b"), vsi("c")]);
        app.go_to_bottom();
        assert_eq!(app.selected, 2);

        app.filter_text = "a".into();
        app.apply_filter();
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut app = app_with(vec![vsi("a"), vsi("b")]);
        app.previous();
        assert_eq!(app.selected, 0);
        app.next();
        app.next();
        assert_eq!(app.selected, 1);
        app.page_up(10);
        assert_eq!(app.selected, 0);
        app.page_down(10);
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn test_visible_range_and_scrolling() {
        let mut app = app_with((0..100).map(|i| vsi(&format!("vm{}", i))).collect());
        app.update_viewport(10);
        assert_eq!(app.visible_range(), 0..10);

        app.selected = 50;
        app.ensure_visible();
        assert!(app.visible_range().contains(&50));

        app.go_to_bottom();
        app.ensure_visible();
        assert_eq!(app.visible_range(), 90..100);
    }

    #[test]
    fn test_describe_requires_selection() {
        let mut app = app_with(vec![]);
        app.enter_describe_mode();
        assert_eq!(app.mode, Mode::Normal);

        let mut app = app_with(vec![vsi("a")]);
        app.enter_describe_mode();
        assert_eq!(app.mode, Mode::Describe);
        assert!(app.selected_item_json().unwrap().contains("\"name\": \"a\""));
    }

    #[test]
    fn test_export_writes_raw_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(vec![vsi("a"), json!({"about": {}})]);
        app.config.export_dir = Some(dir.path().to_path_buf());

        app.export_snapshot();

        assert!(app.error_message.is_none());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let path = entries[0].as_ref().unwrap().path();
        let loaded = tibm::resource::load_snapshot(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    fn live_app(server_filter: bool) -> App {
        let mut app = app_with(vec![vsi("a"), worker("w1")]);
        let endpoints = tibm::ibm::Endpoints::for_region("eu-de").unwrap();
        app.source = Some(LiveSource {
            client: IbmClient::new(endpoints, "guid-1").unwrap(),
            api_key: ApiKey::new("k"),
            server_filter,
        });
        app
    }

    #[test]
    fn test_filter_change_refetches_with_server_filter() {
        let mut app = live_app(true);
        app.next_service_filter();
        assert_eq!(app.service_filter, ServiceFilter::Vsi);
        assert!(app.needs_refresh());
        assert!(app.loading);
    }

    #[test]
    fn test_filter_change_stays_local_without_server_filter() {
        let mut app = live_app(false);
        app.next_service_filter();
        assert!(!app.needs_refresh());
        assert_eq!(app.items.len(), 1);
    }

    #[test]
    fn test_request_refresh_defers_the_fetch() {
        let mut app = live_app(false);
        app.request_refresh();
        assert!(app.needs_refresh());
        assert!(app.loading);
        assert_eq!(app.items.len(), 2);

        let mut app = app_with(vec![vsi("a")]);
        app.request_refresh();
        assert!(!app.needs_refresh());
        assert!(!app.loading);
        assert!(app.status_message.unwrap().contains("nothing to refresh"));
    }

    #[tokio::test]
    async fn test_refresh_without_live_source() {
        let mut app = app_with(vec![vsi("a")]);
        app.refresh().await.unwrap();
        assert!(app.status_message.unwrap().contains("nothing to refresh"));
        assert_eq!(app.items.len(), 1);
    }
}
