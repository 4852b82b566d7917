//! TUI module for autocat
//!
//! Doubles as the input listener: key presses become player control
//! messages, and player notifications arrive through a ring buffer.

pub mod state;
mod timeline;
mod transport;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use autocat::chart::file::load_chart;
use autocat::{ControlMessage, Player, PlayerError, PlayerState, Status};

use super::injector::KeyLamp;
use state::{Tone, UiState};
use timeline::{render_timeline, Preview};
use transport::{render_transport, tone_color};

/// UI application state
pub struct UiApp {
    player: Player,
    /// Ring buffer receiver for player notifications
    status_rx: Consumer<Status>,
    lamp: Arc<KeyLamp>,
    chart_path: Option<PathBuf>,
    /// Schedule for the timeline strip
    preview: Preview,
    state: UiState,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        player: Player,
        status_rx: Consumer<Status>,
        lamp: Arc<KeyLamp>,
        chart_path: Option<PathBuf>,
    ) -> Self {
        let state = UiState::new(player.offset_ns());
        Self {
            player,
            status_rx,
            lamp,
            chart_path,
            preview: Preview::default(),
            state,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_status();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// (Re)load the chart file; the previous chart stays on failure
    pub fn reload_chart(&mut self) {
        let Some(path) = self.chart_path.clone() else {
            return;
        };

        match load_chart(&path) {
            Ok(chart) => {
                // building is pure, so the preview matches what a session plays
                match self.player.config().timeline_builder().build(&chart) {
                    Ok(timeline) => {
                        let idle = self.player.state() == PlayerState::Idle;
                        self.preview.replace(timeline, idle);
                    }
                    Err(err) => log::warn!("no preview for {}: {err}", path.display()),
                }
                self.player.load_chart(Arc::new(chart));
            }
            Err(err) => {
                log::error!("failed to load {}: {err}", path.display());
                self.state.note(format!("Parse error: {err}"), Tone::Halt);
            }
        }
    }

    /// Teardown: stop playback before the injector is released
    pub fn shutdown(&mut self) {
        self.player.shutdown();
    }

    /// Drain player notifications
    fn poll_status(&mut self) {
        while let Ok(status) = self.status_rx.pop() {
            // a new session plays the chart loaded last
            if matches!(status, Status::Started { .. }) {
                self.preview.promote();
            }
            self.state.apply(status);
        }
        if self.player.state() == PlayerState::Idle {
            self.preview.promote();
        }
    }

    fn send(&mut self, message: ControlMessage) {
        match self.player.handle(message) {
            Ok(()) => {}
            // already reported through the status ring
            Err(PlayerError::ChartUnavailable) => {}
            Err(err) => log::debug!("{message:?} failed: {err}"),
        }
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Insert | KeyCode::Char(' ') => self.send(ControlMessage::TogglePlayback),
            KeyCode::Left => self.send(ControlMessage::OffsetDecrease),
            KeyCode::Right => self.send(ControlMessage::OffsetIncrease),
            KeyCode::Char('l') | KeyCode::Char('L') => self.reload_chart(),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Main layout: transport, timeline, status history, help
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Length(4), // Timeline
                Constraint::Min(3),    // Status history
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        render_transport(
            frame,
            chunks[0],
            &self.state,
            self.player.state(),
            self.lamp.is_down(),
            self.lamp.presses(),
        );

        let timeline_block = Block::default().title(" Timeline ").borders(Borders::ALL);
        let timeline_inner = timeline_block.inner(chunks[1]);
        frame.render_widget(timeline_block, chunks[1]);
        render_timeline(
            frame,
            timeline_inner,
            self.preview.shown(),
            self.state.dispatched,
        );

        self.render_history(frame, chunks[2]);

        let help = Paragraph::new(" [Ins/Space] Start/Stop  [←/→] Offset  [L] Reload  [Q] Quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }

    fn render_history(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let block = Block::default()
            .title(Line::styled(
                format!(" {} ", self.state.headline),
                Style::default().fg(tone_color(self.state.tone)),
            ))
            .borders(Borders::ALL);

        let visible = block.inner(area).height as usize;
        let lines: Vec<Line> = self
            .state
            .history
            .iter()
            .rev()
            .take(visible)
            .rev()
            .map(|msg| Line::raw(msg.as_str()))
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
