//! Terminal User Interface rendering module
//!
//! Renders the inventory with ratatui: a header with run context, a table
//! whose columns follow the selected service filter, and a status line.
//!
//! - [`splash`] - Progress screen while the run is collecting
//! - `header` - Instance, region, filter and counts
//! - `help` - Help overlay showing keybindings
//!
//! The table uses virtual scrolling: only visible rows are built, with a
//! scrollbar indicating position.

mod header;
mod help;
pub mod splash;

use crate::app::{App, Mode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState,
    },
    Frame,
};
use tibm::resource::registry::MISSING;

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Header (multi-line)
            Constraint::Min(1),    // Table or describe
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);

    match app.mode {
        Mode::Describe => render_describe_view(f, app, chunks[1]),
        _ => render_main_content(f, app, chunks[1]),
    }

    render_status(f, app, chunks[2]);

    if app.mode == Mode::Help {
        help::render(f);
    }
}

fn render_main_content(f: &mut Frame, app: &mut App, area: Rect) {
    let show_filter = app.filter_active || !app.filter_text.is_empty();

    if show_filter {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(area);

        render_filter_bar(f, app, chunks[0]);
        render_table(f, app, chunks[1]);
    } else {
        render_table(f, app, area);
    }
}

fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let cursor_style = if app.filter_active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let filter_display = if app.filter_active {
        format!("/{}_", app.filter_text)
    } else {
        format!("/{}", app.filter_text)
    };

    let paragraph = Paragraph::new(Line::from(vec![Span::styled(filter_display, cursor_style)]));
    f.render_widget(paragraph, area);
}

fn render_table(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(view) = app.current_view() else {
        let msg = Paragraph::new("Unknown view").style(Style::default().fg(Color::Red));
        f.render_widget(msg, area);
        return;
    };

    let count = app.filtered_items.len();
    let total = app.items.len();
    let title = if app.filter_text.is_empty() {
        format!(" {}[{}] ", app.view_title(), count)
    } else {
        format!(" {}[{}/{}] ", app.view_title(), count, total)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if app.filtered_items.is_empty() {
        let msg = Paragraph::new("No resources match")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(msg, inner_area);
        return;
    }

    // Account for header row
    let visible_height = (inner_area.height as usize).saturating_sub(1);
    app.update_viewport(visible_height);
    app.ensure_visible();

    let needs_scrollbar = count > visible_height;
    let table_area = if needs_scrollbar {
        Rect {
            width: inner_area.width.saturating_sub(1),
            ..inner_area
        }
    } else {
        inner_area
    };

    let header_cells: Vec<Cell> = view
        .columns
        .iter()
        .map(|col| {
            Cell::from(format!(" {}", col.header)).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    let header = Row::new(header_cells).height(1);

    let range = app.visible_range();
    let rows: Vec<Row> = app.filtered_items[range.clone()]
        .iter()
        .map(|item| {
            let cells = view.columns.iter().map(|col| {
                let value = col.render(item);
                let style = if value == MISSING {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Cell::from(format!(" {}", truncate_string(&value, 38))).style(style)
            });
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = view
        .columns
        .iter()
        .map(|col| Constraint::Percentage(col.width))
        .collect();

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    // Selection index relative to the rendered slice
    let mut state = TableState::default();
    if app.selected >= range.start && app.selected < range.end {
        state.select(Some(app.selected - range.start));
    }

    f.render_stateful_widget(table, table_area, &mut state);

    if needs_scrollbar {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(symbols::scrollbar::VERTICAL)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        let mut scrollbar_state =
            ScrollbarState::new(count.saturating_sub(visible_height)).position(app.scroll_offset);

        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }
}

/// Truncate string for display (Unicode-safe)
fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

fn render_describe_view(f: &mut Frame, app: &App, area: Rect) {
    let json = app
        .selected_item_json()
        .unwrap_or_else(|| "No item selected".to_string());

    let lines: Vec<Line> = json.lines().map(highlight_json_line).collect();
    let total_lines = lines.len();

    let title = match app.selected_item().and_then(|item| item["name"].as_str()) {
        Some(name) => format!(" {} ", name),
        None => " Details ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let visible_lines = inner_area.height as usize;
    let max_scroll = total_lines.saturating_sub(visible_lines);
    let scroll = app.describe_scroll.min(max_scroll);

    let paragraph = Paragraph::new(lines).scroll((scroll as u16, 0));
    f.render_widget(paragraph, inner_area);

    if total_lines > visible_lines {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(max_scroll + visible_lines).position(scroll);
        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }
}

/// Apply JSON syntax highlighting to a single pretty-printed line
fn highlight_json_line(line: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = line.chars().peekable();
    let mut current = String::new();
    let mut is_key = true;

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                flush_value(&mut spans, &mut current);

                let mut string_content = String::from("\"");
                while let Some(next_c) = chars.next() {
                    string_content.push(next_c);
                    if next_c == '\\' {
                        if let Some(escaped) = chars.next() {
                            string_content.push(escaped);
                        }
                        continue;
                    }
                    if next_c == '"' {
                        break;
                    }
                }

                let style = if is_key && line_has_key_after(&mut chars.clone()) {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Green)
                };
                spans.push(Span::styled(string_content, style));
            },
            ':' => {
                flush_value(&mut spans, &mut current);
                spans.push(Span::styled(":", Style::default().fg(Color::White)));
                is_key = false;
            },
            ',' => {
                flush_value(&mut spans, &mut current);
                spans.push(Span::styled(",", Style::default().fg(Color::White)));
                is_key = true;
            },
            '{' | '}' | '[' | ']' => {
                flush_value(&mut spans, &mut current);
                spans.push(Span::styled(
                    c.to_string(),
                    Style::default().fg(Color::Yellow),
                ));
            },
            ' ' | '\t' => {
                flush_value(&mut spans, &mut current);
                spans.push(Span::raw(c.to_string()));
            },
            _ => current.push(c),
        }
    }

    flush_value(&mut spans, &mut current);
    Line::from(spans)
}

/// A quoted string is a key only when a `:` follows it
fn line_has_key_after(rest: &mut std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    rest.find(|c| !c.is_whitespace()) == Some(':')
}

fn flush_value(spans: &mut Vec<Span<'static>>, current: &mut String) {
    if !current.is_empty() {
        let style = get_json_value_style(current);
        spans.push(Span::styled(std::mem::take(current), style));
    }
}

/// Get style for JSON values (numbers, booleans, null)
fn get_json_value_style(value: &str) -> Style {
    let trimmed = value.trim();
    if trimmed == "null" {
        Style::default().fg(Color::DarkGray)
    } else if trimmed == "true" || trimmed == "false" {
        Style::default().fg(Color::Magenta)
    } else if trimmed.parse::<f64>().is_ok() {
        Style::default().fg(Color::LightBlue)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if let Some(err) = &app.error_message {
        (
            format!("Error: {}", err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if app.loading {
        ("Loading...".to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(msg) = &app.status_message {
        (msg.clone(), Style::default().fg(Color::Green))
    } else if app.mode == Mode::Describe {
        (
            "j/k: scroll | q/d/Esc: back".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else if app.filter_active {
        (
            "Type to filter | Enter: apply | Esc: clear".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (
            "Tab: next filter | /: search | e: export | R: reload".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };

    let line = Line::from(vec![
        Span::styled(
            format!("<{}>", app.service_filter),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(text, style),
    ]);

    f.render_widget(Paragraph::new(line), area);
}
