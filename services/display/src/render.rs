//! Kiosk screen layout
//!
//! ```text
//! ┌ Ledger Wall ───────────────────────┐
//! │ Ann                                │
//! │ hello everyone                     │
//! └────────────────────────────────────┘
//!            •  …  •  ━━━  •  …  •
//!                   5 / 12
//! ```

use crate::indicator::{self, Slot};
use crate::rotation::Rotation;
use ratatui::{
    layout::{Alignment, Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

pub const WAITING_TEXT: &str = "Waiting for the first message";

pub fn draw(frame: &mut Frame, rotation: &Rotation) {
    let [card, dots, status, banner] = Layout::vertical([
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let block = Block::default()
        .title(" Ledger Wall ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(
        Paragraph::new(card_lines(rotation))
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        card,
    );

    if let Some(current) = rotation.current_index() {
        if rotation.len() > 1 {
            frame.render_widget(
                Paragraph::new(indicator_line(rotation.len(), current)).alignment(Alignment::Center),
                dots,
            );
        }
    }

    frame.render_widget(
        Paragraph::new(status_text(rotation))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray)),
        status,
    );

    if let Some(error) = rotation.error() {
        frame.render_widget(
            Paragraph::new(format!("Error: {error}"))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::LightRed)),
            banner,
        );
    }
}

fn card_lines(rotation: &Rotation) -> Vec<Line<'_>> {
    let Some(record) = rotation.current() else {
        return vec![Line::raw(""), Line::raw(WAITING_TEXT)];
    };

    let name = Line::styled(
        record.name.as_str(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    );
    let body = if record.is_image() {
        Line::from(vec![
            Span::styled("[image] ", Style::default().fg(Color::Yellow)),
            Span::raw(record.content.as_str()),
        ])
    } else {
        Line::styled(record.content.as_str(), Style::default().add_modifier(Modifier::BOLD))
    };

    vec![Line::raw(""), name, Line::raw(""), body]
}

fn indicator_line(len: usize, current: usize) -> Line<'static> {
    let mut spans = Vec::new();
    for slot in indicator::slots(len, current) {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(match slot {
            Slot::Dot { current: true, .. } => Span::styled("━━━", Style::default().fg(Color::Cyan)),
            Slot::Dot { .. } => Span::styled("•", Style::default().fg(Color::DarkGray)),
            Slot::Gap => Span::styled("…", Style::default().fg(Color::Gray)),
        });
    }
    Line::from(spans)
}

/// Position line under the card
pub fn status_text(rotation: &Rotation) -> String {
    match rotation.current_index() {
        Some(current) => format!("{} / {}", current + 1, rotation.len()),
        None => "Ready for messages".to_string(),
    }
}
