//! Timeline widget - key-down stretches of the schedule with a playhead

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use autocat::{EventKind, Timeline};

/// Schedule shown in the strip.
///
/// A chart reloaded mid-session waits in `pending` so the playhead keeps
/// indexing the schedule that is actually playing.
#[derive(Debug, Default)]
pub struct Preview {
    shown: Timeline,
    pending: Option<Timeline>,
}

impl Preview {
    pub fn shown(&self) -> &Timeline {
        &self.shown
    }

    /// Show `timeline` now when idle, otherwise once the session ends
    pub fn replace(&mut self, timeline: Timeline, idle: bool) {
        if idle {
            self.shown = timeline;
            self.pending = None;
        } else {
            self.pending = Some(timeline);
        }
    }

    /// Swap in a held-back schedule, if any
    pub fn promote(&mut self) {
        if let Some(timeline) = self.pending.take() {
            self.shown = timeline;
        }
    }
}

/// Intervals (start_ns, end_ns) during which the key is held
fn held_intervals(timeline: &Timeline) -> Vec<(i64, i64)> {
    let mut intervals = Vec::new();
    let mut down = 0usize;
    let mut since = 0i64;

    for event in timeline {
        match event.kind {
            EventKind::Press => {
                if down == 0 {
                    since = event.timestamp_ns;
                }
                down += 1;
            }
            EventKind::Release => {
                down = down.saturating_sub(1);
                if down == 0 {
                    intervals.push((since, event.timestamp_ns));
                }
            }
        }
    }

    intervals
}

/// Render the schedule across the full width, playhead at the next event
pub fn render_timeline(frame: &mut Frame, area: Rect, timeline: &Timeline, dispatched: usize) {
    if area.height < 2 || area.width < 10 {
        return;
    }

    if timeline.is_empty() {
        let empty = Paragraph::new(" nothing to play")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width as usize;
    let span_ns = timeline.duration_ns().max(1) as f64;
    let ns_per_char = span_ns / width as f64;
    let intervals = held_intervals(timeline);

    let strip: String = (0..width)
        .map(|col| {
            let from = (col as f64 * ns_per_char) as i64;
            let to = ((col + 1) as f64 * ns_per_char) as i64;
            let held = intervals.iter().any(|&(s, e)| s < to && e >= from);
            if held {
                '▓'
            } else {
                '░'
            }
        })
        .collect();

    let playhead_ns = timeline
        .get(dispatched.min(timeline.len() - 1))
        .map_or(0, |e| e.timestamp_ns);
    let playhead_char = ((playhead_ns as f64 / ns_per_char) as usize).min(width - 1);
    let playhead: String = (0..width)
        .map(|i| if i == playhead_char { '▲' } else { ' ' })
        .collect();

    let lines = vec![
        Line::from(Span::styled(strip, Style::default().fg(Color::Cyan))),
        Line::from(Span::styled(playhead, Style::default().fg(Color::Yellow))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}
