//! Header Component
//!
//! Displays the run origin, region, active filter and record counts.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tibm::inventory::Origin;
use tibm::VERSION;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" tibm v{} ", VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Row 1: Origin and region
    let (origin_label, origin_value) = match &app.inventory.origin {
        Origin::Live { instance_id } => (" Instance: ", instance_id.as_str()),
        Origin::Snapshot { path } => (" Snapshot: ", path.as_str()),
    };
    let origin_line = Line::from(vec![
        Span::styled(origin_label, Style::default().fg(Color::DarkGray)),
        Span::styled(
            origin_value,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Region: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            &app.region,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(origin_line), rows[0]);

    // Row 2: Filter and counts
    let mut counts = vec![
        Span::styled(" Filter: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.view_title(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(loaded_text(app), Style::default().fg(Color::White)),
    ];
    if app.items.len() != app.filtered_items.len() {
        counts.push(Span::styled(
            format!("  showing {} of {}", app.filtered_items.len(), app.items.len()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(counts)), rows[1]);

    // Row 3: Run totals
    let totals_style = if app.inventory.discarded > 0 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(totals_text(app), totals_style))),
        rows[2],
    );

    // Row 4: Help hint
    let help_line = Line::from(vec![
        Span::styled(
            " ?:help  /:search  Tab:filter  e:export  R:reload  q:quit",
            Style::default().fg(Color::DarkGray),
        ),
        if app.inventory.is_live() {
            Span::raw("")
        } else {
            Span::styled(
                "  [SNAPSHOT]",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        },
    ]);
    f.render_widget(Paragraph::new(help_line), rows[3]);
}

/// Records the current filter lets through
fn loaded_text(app: &App) -> String {
    format!("{} results loaded", app.items.len())
}

fn totals_text(app: &App) -> String {
    format!(
        " Total: {} records, {} discarded",
        app.inventory.records.len(),
        app.inventory.discarded
    )
}
