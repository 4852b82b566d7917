//! Transport bar widget - shows chart, play state, offset and the key lamp

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use autocat::PlayerState;

use super::state::{Tone, UiState};

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Ok => Color::Green,
        Tone::Busy => Color::Yellow,
        Tone::Adjust => Color::Blue,
        Tone::Halt => Color::Red,
    }
}

/// Events dispatched out of the session total, with a percentage
fn progress_label(state: &UiState) -> String {
    format!(
        "{}/{} ({:.0}%)",
        state.dispatched,
        state.total,
        state.progress() * 100.0
    )
}

/// Render the transport bar
pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    player_state: PlayerState,
    key_down: bool,
    presses: u64,
) {
    let block = Block::default().title(" autocat ").borders(Borders::ALL);

    let chart = match &state.chart {
        Some((title, tiles)) => format!(" {title} ({tiles} tiles)  "),
        None => " no chart  ".to_string(),
    };

    let (symbol, label, color) = match player_state {
        PlayerState::Idle => ("■", "Idle", Color::DarkGray),
        PlayerState::Running => ("▶", "Running", Color::Green),
        PlayerState::Stopping => ("…", "Stopping", Color::Yellow),
    };

    let lamp = if key_down { "● KEY" } else { "○ key" };

    let line = Line::from(vec![
        Span::styled(chart, Style::default().fg(Color::Cyan)),
        Span::styled(format!("{symbol} {label}  "), Style::default().fg(color)),
        Span::styled(
            format!("Offset: {:+.0}ms  ", state.offset_ns as f64 / 1e6),
            Style::default().fg(tone_color(Tone::Adjust)),
        ),
        Span::styled(
            format!("{}  ", progress_label(state)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("{lamp} ({presses})"),
            Style::default().fg(if key_down { Color::Magenta } else { Color::DarkGray }),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
