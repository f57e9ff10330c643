//! Event Handling
//!
//! Keyboard and event handling for tibm.

use crate::app::{App, Mode};
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::Duration;

/// Handle events, returns true if app should quit
pub async fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            return handle_key_event(app, key.code, key.modifiers).await;
        }
    }
    Ok(false)
}

async fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers).await,
        Mode::Help => Ok(handle_help_mode(app, code)),
        Mode::Describe => Ok(handle_describe_mode(app, code, modifiers)),
    }
}

async fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Handle filter input first
    if app.filter_active {
        match code {
            KeyCode::Esc => {
                app.clear_filter();
            },
            KeyCode::Enter => {
                app.filter_active = false;
            },
            KeyCode::Backspace => {
                app.filter_text.pop();
                app.apply_filter();
            },
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.filter_text.push(c);
                app.apply_filter();
            },
            _ => {},
        }
        return Ok(false);
    }

    // Double-g goes to top
    if code == KeyCode::Char('g') {
        if let Some((KeyCode::Char('g'), time)) = app.last_key_press {
            if time.elapsed() < Duration::from_millis(1000) {
                app.go_to_top();
                app.last_key_press = None;
                return Ok(false);
            }
        }
        app.last_key_press = Some((code, std::time::Instant::now()));
        return Ok(false);
    }
    app.last_key_press = None;

    match code {
        // Quit
        KeyCode::Char('q') => return Ok(true),

        // Navigation - vim style + accessible alternatives
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Home => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),
        KeyCode::PageDown => app.page_down(10),
        KeyCode::PageUp => app.page_up(10),
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_down(10);
        },
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_up(10);
        },

        // Service filter
        KeyCode::Tab => app.next_service_filter(),
        KeyCode::BackTab => app.prev_service_filter(),

        // Text search
        KeyCode::Char('/') => {
            app.filter_active = true;
        },
        KeyCode::Esc => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
            app.status_message = None;
            app.error_message = None;
        },

        // Describe
        KeyCode::Enter | KeyCode::Char('d') => app.enter_describe_mode(),

        // Export raw snapshot
        KeyCode::Char('e') => app.export_snapshot(),

        // Re-run aggregation
        KeyCode::Char('R') => app.request_refresh(),

        // Help
        KeyCode::Char('?') => app.enter_help_mode(),

        _ => {},
    }

    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> bool {
    if matches!(code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
        app.exit_mode();
    }
    false
}

fn handle_describe_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('d') | KeyCode::Backspace => {
            app.exit_mode();
        },
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Char('g') | KeyCode::Home => app.go_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.go_to_bottom(),
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.describe_scroll = app.describe_scroll.saturating_sub(10);
        },
        _ => {},
    }
    false
}
