//! Splash Screen
//!
//! Progress screen shown while a run authenticates and pages configs.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

const LIVE_STEPS: &[&str] = &["Authenticate with IAM", "Fetch configs", "Normalize records"];
const SNAPSHOT_STEPS: &[&str] = &["Read snapshot", "Normalize records"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum StepState {
    Done,
    Running,
    Pending,
}

/// Splash screen state
pub struct SplashState {
    message: String,
    steps: &'static [&'static str],
    completed_steps: usize,
}

impl SplashState {
    pub fn new() -> Self {
        Self {
            message: "Initializing...".to_string(),
            steps: LIVE_STEPS,
            completed_steps: 0,
        }
    }

    /// Steps for a `--from-file` run, which has nothing to authenticate
    pub fn snapshot() -> Self {
        Self {
            steps: SNAPSHOT_STEPS,
            ..Self::new()
        }
    }

    pub fn set_message(&mut self, message: &str) {
        self.message = message.to_string();
    }

    pub fn complete_step(&mut self) {
        self.completed_steps = (self.completed_steps + 1).min(self.steps.len());
    }

    fn progress(&self) -> f64 {
        self.completed_steps as f64 / self.steps.len() as f64
    }

    fn step_state(&self, index: usize) -> StepState {
        match index.cmp(&self.completed_steps) {
            std::cmp::Ordering::Less => StepState::Done,
            std::cmp::Ordering::Equal => StepState::Running,
            std::cmp::Ordering::Greater => StepState::Pending,
        }
    }

    fn step_lines(&self) -> Vec<Line<'static>> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let (marker, style) = match self.step_state(i) {
                    StepState::Done => ("[x]", Style::default().fg(Color::Green)),
                    StepState::Running => (
                        "[>]",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    StepState::Pending => ("[ ]", Style::default().fg(Color::DarkGray)),
                };
                Line::from(Span::styled(format!("{} {}", marker, label), style))
            })
            .collect()
    }
}

impl Default for SplashState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render(f: &mut Frame, state: &SplashState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(14),
            Constraint::Percentage(35),
        ])
        .split(area);

    let center = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(chunks[1])[1];

    let logo_style = Style::default().fg(Color::Cyan);
    let logo = vec![
        Line::from(Span::styled("  _   _ _               ", logo_style)),
        Line::from(Span::styled(" | |_(_) |__  _ __ ___  ", logo_style)),
        Line::from(Span::styled(" | __| | '_ \\| '_ ` _ \\ ", logo_style)),
        Line::from(Span::styled(" | |_| | |_) | | | | | |", logo_style)),
        Line::from(Span::styled("  \\__|_|_.__/|_| |_| |_|", logo_style)),
        Line::from(""),
        Line::from(Span::styled(
            "IBM Cloud config aggregator inventory",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let logo_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = logo_block.inner(center);
    f.render_widget(logo_block, center);

    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(state.steps.len() as u16),
            Constraint::Length(1),
        ])
        .split(inner);

    let logo_para = Paragraph::new(logo).alignment(Alignment::Center);
    f.render_widget(logo_para, inner_chunks[0]);

    let steps = Paragraph::new(state.step_lines()).alignment(Alignment::Center);
    f.render_widget(steps, inner_chunks[1]);

    let progress = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent((state.progress() * 100.0) as u16)
        .label(Span::styled(
            state.message.as_str(),
            Style::default().fg(Color::White),
        ));

    f.render_widget(progress, inner_chunks[2]);
}
