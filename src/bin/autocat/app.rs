//! App - wires the player, key lamp and terminal UI together

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::Result as EyreResult;
use rtrb::RingBuffer;

use autocat::{MonotonicClock, Player, PlayerConfig, Status};

use super::injector::{KeyLamp, LampInjector};
use super::ui::UiApp;

/// Status ring capacity; one progress message per event plus control chatter
const STATUS_CAPACITY: usize = 1024;

/// Main application builder
pub struct App {
    config: PlayerConfig,
    chart_path: Option<PathBuf>,
}

impl App {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            chart_path: None,
        }
    }

    /// Chart file to load at startup (and on reload)
    pub fn chart(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_path = Some(path.into());
        self
    }

    /// Run the application until the user quits
    pub fn run(self) -> EyreResult<()> {
        let (status_tx, status_rx) = RingBuffer::<Status>::new(STATUS_CAPACITY);
        let lamp = Arc::new(KeyLamp::default());

        let player = Player::new(
            self.config,
            Arc::new(MonotonicClock::new()),
            LampInjector::new(Arc::clone(&lamp)),
            status_tx,
        );

        let mut ui = UiApp::new(player, status_rx, lamp, self.chart_path);
        ui.reload_chart();

        let mut terminal = ratatui::init();
        let result = ui.run(&mut terminal);
        ratatui::restore();

        // teardown before the injector goes away
        ui.shutdown();
        result
    }
}
