//! Help Overlay
//!
//! Shows keyboard shortcuts.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k, ↑/↓", "Move up/down"),
            ("gg", "Go to top"),
            ("G", "Go to bottom"),
            ("Ctrl+d/u", "Page down/up"),
        ],
    ),
    (
        "Views",
        &[
            ("Tab/S-Tab", "Next/previous resource filter"),
            ("Enter/d", "View record details"),
            ("Esc/q", "Go back from details"),
        ],
    ),
    (
        "Search",
        &[("/", "Search visible columns"), ("Esc", "Clear search")],
    ),
    (
        "Run",
        &[
            ("e", "Export raw configs to a file"),
            ("R", "Reload from the aggregator"),
        ],
    ),
    ("", &[("?/Esc", "Close help"), ("q", "Quit application")]),
];

fn help_lines() -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (title, keys) in SECTIONS {
        if !title.is_empty() {
            lines.push(Line::from(Span::styled(
                *title,
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        for (key, description) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*description),
            ]));
        }
        lines.push(Line::from(""));
    }

    lines.pop();
    lines
}

pub fn render(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(60, 70, area);

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(help_lines())
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
