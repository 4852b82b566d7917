//! Player - the playback state machine behind the start/stop/offset triggers
//!
//! At most one dispatch loop runs at a time. Starting builds the timeline
//! once, spawns the loop on its own thread and returns immediately. Stopping
//! signals cancellation, waits a short bounded time for the loop to notice,
//! then reports idle whether or not the loop has confirmed its exit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::chart::ChartProvider;
use crate::clock::Clock;
use crate::config::PlayerConfig;
use crate::error::{PlaybackError, PlayerError};
use crate::inject::InputInjector;
use crate::offset::OffsetController;
use crate::scheduler::{self, CancellationToken, SessionReport};
use crate::status::{Status, StatusSink};
use crate::timeline::Timeline;

/// Poll interval while waiting for a loop to exit
const STOP_POLL: Duration = Duration::from_millis(1);

/// Where the player is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Running,
    /// A stop request is waiting for the loop to exit
    Stopping,
}

/// Signals delivered by the input listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Start when idle, stop when running
    TogglePlayback,
    /// Fire subsequent events earlier by one nudge step
    OffsetDecrease,
    /// Fire subsequent events later by one nudge step
    OffsetIncrease,
}

/// State visible to both the control side and the dispatch loop
struct Shared {
    state: Mutex<PlayerState>,
    /// Number of the newest session; stale loops must not touch the state
    session: AtomicU64,
    sink: Mutex<Box<dyn StatusSink>>,
}

impl Shared {
    fn emit(&self, status: Status) {
        lock(&self.sink).push(status);
    }

    fn set_state(&self, state: PlayerState) {
        *lock(&self.state) = state;
    }

    /// Exit path of every session, whatever ended it
    fn finish_session(
        &self,
        session: u64,
        offset: &OffsetController,
        result: Result<SessionReport, PlaybackError>,
    ) {
        if self.session.load(Ordering::Acquire) == session {
            self.set_state(PlayerState::Idle);
            offset.disarm();
        }

        match result {
            Ok(report) if report.cancelled => {
                log::info!(
                    "session {session} cancelled after {}/{} events",
                    report.dispatched,
                    report.total
                );
            }
            Ok(report) => {
                log::info!("session {session} finished ({} events)", report.dispatched);
                self.emit(Status::Finished(report));
            }
            Err(err) => {
                log::error!("session {session} aborted: {err}");
                self.emit(Status::Error(err.to_string()));
            }
        }
    }
}

/// Handle to the running loop
struct Worker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Worker {
    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel and give the loop up to `wait` to exit; true if it did
    fn cancel_and_wait(&self, wait: Duration) -> bool {
        self.cancel.cancel();
        let deadline = Instant::now() + wait;
        while self.is_alive() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(STOP_POLL);
        }
        true
    }
}

/// Autoplay controller: owns the loaded chart, the offset and the loop.
///
/// Every entry point takes `&self`, so the player can be shared with
/// whatever thread the input listener runs on.
pub struct Player {
    config: PlayerConfig,
    chart: Mutex<Option<Arc<dyn ChartProvider>>>,
    offset: OffsetController,
    clock: Arc<dyn Clock>,
    injector: Arc<Mutex<Box<dyn InputInjector>>>,
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl Player {
    pub fn new<J, S>(config: PlayerConfig, clock: Arc<dyn Clock>, injector: J, sink: S) -> Self
    where
        J: InputInjector + 'static,
        S: StatusSink + 'static,
    {
        let offset = OffsetController::with_offset(config.offset_ns);
        Self {
            config,
            chart: Mutex::new(None),
            offset,
            clock,
            injector: Arc::new(Mutex::new(Box::new(injector))),
            shared: Arc::new(Shared {
                state: Mutex::new(PlayerState::Idle),
                session: AtomicU64::new(0),
                sink: Mutex::new(Box::new(sink)),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Replace the loaded chart; a running session keeps its own timeline
    pub fn load_chart(&self, chart: Arc<dyn ChartProvider>) {
        log::info!("chart loaded: {} ({} tiles)", chart.title(), chart.tiles().len());
        self.shared.emit(Status::ChartLoaded {
            title: chart.title().to_string(),
            tiles: chart.tiles().len(),
        });
        *lock(&self.chart) = Some(chart);
    }

    pub fn has_chart(&self) -> bool {
        lock(&self.chart).is_some()
    }

    pub fn state(&self) -> PlayerState {
        *lock(&self.shared.state)
    }

    pub fn offset_ns(&self) -> i64 {
        self.offset.current()
    }

    /// Handle on the shared offset, for display
    pub fn offset(&self) -> &OffsetController {
        &self.offset
    }

    /// Whether a dispatch loop thread still exists, even an abandoned one
    pub fn is_session_alive(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(Worker::is_alive)
    }

    /// Entry point for input listener signals
    pub fn handle(&self, message: ControlMessage) -> Result<(), PlayerError> {
        match message {
            ControlMessage::TogglePlayback => self.toggle(),
            ControlMessage::OffsetDecrease => {
                self.nudge(-self.config.nudge_step_ns);
                Ok(())
            }
            ControlMessage::OffsetIncrease => {
                self.nudge(self.config.nudge_step_ns);
                Ok(())
            }
        }
    }

    /// Start when idle, stop when running
    pub fn toggle(&self) -> Result<(), PlayerError> {
        if !self.has_chart() {
            self.shared.emit(Status::ChartUnavailable);
            return Err(PlayerError::ChartUnavailable);
        }

        match self.state() {
            PlayerState::Idle => self.start(),
            PlayerState::Running => {
                self.stop();
                Ok(())
            }
            PlayerState::Stopping => Ok(()),
        }
    }

    /// Build the timeline and spawn the dispatch loop.
    ///
    /// A no-op while a loop (even an abandoned one) is still alive.
    pub fn start(&self) -> Result<(), PlayerError> {
        let Some(chart) = lock(&self.chart).clone() else {
            self.shared.emit(Status::ChartUnavailable);
            return Err(PlayerError::ChartUnavailable);
        };

        let mut worker = lock(&self.worker);
        if worker.as_ref().is_some_and(Worker::is_alive) {
            log::debug!("start ignored: playback loop still alive");
            return Ok(());
        }
        if self.state() != PlayerState::Idle {
            return Ok(());
        }

        let timeline = match self.config.timeline_builder().build(chart.as_ref()) {
            Ok(timeline) => timeline,
            Err(err) => {
                let err = PlaybackError::from(err);
                log::error!("failed to build timeline: {err}");
                self.shared.emit(Status::Error(err.to_string()));
                return Err(err.into());
            }
        };

        let session = self.shared.session.fetch_add(1, Ordering::AcqRel) + 1;
        let cancel = CancellationToken::new();
        let events = timeline.len();

        self.shared.set_state(PlayerState::Running);
        self.offset.arm();
        log::info!("session {session} starting: {} ({events} events)", chart.title());
        self.shared.emit(Status::Started { events });

        match self.spawn_loop(session, timeline, cancel.clone()) {
            Ok(handle) => {
                *worker = Some(Worker { handle, cancel });
                Ok(())
            }
            Err(err) => {
                self.shared.set_state(PlayerState::Idle);
                self.offset.disarm();
                self.shared.emit(Status::Error(err.to_string()));
                Err(err.into())
            }
        }
    }

    fn spawn_loop(
        &self,
        session: u64,
        timeline: Timeline,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>, PlaybackError> {
        let shared = Arc::clone(&self.shared);
        let offset = self.offset.clone();
        let clock = Arc::clone(&self.clock);
        let injector = Arc::clone(&self.injector);

        std::thread::Builder::new()
            .name(format!("autocat-playback-{session}"))
            .spawn(move || {
                let total = timeline.len();
                let result = match injector.lock() {
                    Ok(mut injector) => scheduler::run_observed(
                        &timeline,
                        &offset,
                        &cancel,
                        clock.as_ref(),
                        &mut **injector,
                        |idx, _| {
                            shared.emit(Status::Progress {
                                dispatched: idx + 1,
                                total,
                            })
                        },
                    ),
                    Err(_) => Err(PlaybackError::InjectorPoisoned),
                };
                shared.finish_session(session, &offset, result);
            })
            .map_err(PlaybackError::Spawn)
    }

    /// Cancel the running loop and return to idle after a bounded wait
    pub fn stop(&self) {
        {
            let mut state = lock(&self.shared.state);
            if *state != PlayerState::Running {
                return;
            }
            *state = PlayerState::Stopping;
        }

        let mut worker = lock(&self.worker);
        if let Some(w) = worker.as_ref() {
            if w.cancel_and_wait(self.config.stop_wait_duration()) {
                if let Some(done) = worker.take() {
                    let _ = done.handle.join();
                }
            } else {
                log::warn!(
                    "playback loop still alive after {}ms, forcing idle",
                    self.config.stop_wait_ms
                );
            }
        }

        self.shared.set_state(PlayerState::Idle);
        self.offset.disarm();
        log::info!("playback stopped");
        self.shared.emit(Status::Stopped);
    }

    /// Shift subsequent events by `delta_ns` if a session is running
    pub fn nudge(&self, delta_ns: i64) -> Option<i64> {
        let applied = self.offset.nudge(delta_ns);
        if let Some(offset_ns) = applied {
            log::debug!("offset now {offset_ns}ns");
            self.shared.emit(Status::OffsetChanged { offset_ns });
        }
        applied
    }

    /// Teardown: stop any session and give the loop a last chance to exit
    pub fn shutdown(&self) {
        self.stop();
        if let Some(worker) = lock(&self.worker).take() {
            if worker.cancel_and_wait(self.config.stop_wait_duration()) {
                let _ = worker.handle.join();
            } else {
                log::warn!("abandoning playback loop at shutdown");
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::TempoChart;
    use crate::clock::{ManualClock, MonotonicClock};
    use crate::error::{ChartError, InjectError};
    use crate::inject::RecordingInjector;
    use crate::timeline::EventKind;

    type Statuses = Arc<Mutex<Vec<Status>>>;

    /// Injector that shares its record with the test.
    #[derive(Clone, Default)]
    struct SharedInjector(Arc<Mutex<RecordingInjector>>);

    impl InputInjector for SharedInjector {
        fn press(&mut self) -> Result<(), InjectError> {
            self.0.lock().unwrap().press()
        }

        fn release(&mut self) -> Result<(), InjectError> {
            self.0.lock().unwrap().release()
        }
    }

    impl SharedInjector {
        fn events(&self) -> Vec<EventKind> {
            self.0.lock().unwrap().events().to_vec()
        }
    }

    fn player_with(clock: Arc<dyn Clock>) -> (Player, SharedInjector, Statuses) {
        let injector = SharedInjector::default();
        let statuses: Statuses = Default::default();
        let player = Player::new(
            PlayerConfig::default(),
            clock,
            injector.clone(),
            statuses.clone(),
        );
        (player, injector, statuses)
    }

    fn wait_for_idle(player: &Player) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while player.is_session_alive() || player.state() != PlayerState::Idle {
            assert!(Instant::now() < deadline, "session never finished");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn two_tile_chart() -> Arc<dyn ChartProvider> {
        Arc::new(
            TempoChart::builder(120.0)
                .tap(1.0)
                .hold(1.0, 1.0)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn start_without_chart_is_chart_unavailable() {
        let (player, _, statuses) = player_with(Arc::new(ManualClock::new()));

        let result = player.handle(ControlMessage::TogglePlayback);

        assert!(matches!(result, Err(PlayerError::ChartUnavailable)));
        assert_eq!(player.state(), PlayerState::Idle);
        assert!(!player.is_session_alive());
        assert_eq!(*statuses.lock().unwrap(), vec![Status::ChartUnavailable]);
    }

    #[test]
    fn session_runs_to_completion_and_returns_to_idle() {
        // virtual time: the whole chart plays instantly
        let (player, injector, statuses) = player_with(Arc::new(ManualClock::new()));
        player.load_chart(two_tile_chart());

        player.handle(ControlMessage::TogglePlayback).unwrap();
        wait_for_idle(&player);

        use EventKind::*;
        assert_eq!(injector.events(), vec![Press, Release, Press, Release]);

        let statuses = statuses.lock().unwrap();
        assert!(statuses.contains(&Status::Started { events: 4 }));
        assert!(statuses.contains(&Status::Progress { dispatched: 4, total: 4 }));
        assert!(matches!(statuses.last(), Some(Status::Finished(r)) if r.completed()));
    }

    #[test]
    fn chart_stays_loaded_for_another_run() {
        let (player, injector, _) = player_with(Arc::new(ManualClock::new()));
        player.load_chart(two_tile_chart());

        player.start().unwrap();
        wait_for_idle(&player);
        player.start().unwrap();
        wait_for_idle(&player);

        assert!(player.has_chart());
        assert_eq!(injector.events().len(), 8);
    }

    #[test]
    fn stop_cancels_and_reports_idle() {
        // real clock: the 2s countdown keeps the loop asleep
        let (player, injector, statuses) = player_with(Arc::new(MonotonicClock::new()));
        player.load_chart(two_tile_chart());

        player.handle(ControlMessage::TogglePlayback).unwrap();
        assert_eq!(player.state(), PlayerState::Running);

        player.handle(ControlMessage::TogglePlayback).unwrap();
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(statuses.lock().unwrap().last(), Some(&Status::Stopped));

        // once the abandoned loop wakes it must exit without dispatching
        wait_for_idle(&player);
        assert!(injector.events().is_empty());
    }

    #[test]
    fn start_while_old_loop_alive_is_a_no_op() {
        let (player, _, statuses) = player_with(Arc::new(MonotonicClock::new()));
        player.load_chart(two_tile_chart());

        player.start().unwrap();
        player.stop();
        assert!(player.is_session_alive());

        player.start().unwrap();
        assert_eq!(player.state(), PlayerState::Idle);
        let starts = statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|s| matches!(s, Status::Started { .. }))
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn nudges_only_apply_while_running() {
        let (player, _, statuses) = player_with(Arc::new(MonotonicClock::new()));
        player.load_chart(two_tile_chart());

        player.handle(ControlMessage::OffsetIncrease).unwrap();
        assert_eq!(player.offset_ns(), 0);

        player.start().unwrap();
        player.handle(ControlMessage::OffsetIncrease).unwrap();
        player.handle(ControlMessage::OffsetIncrease).unwrap();
        player.handle(ControlMessage::OffsetDecrease).unwrap();
        assert_eq!(player.offset_ns(), 5_000_000);

        player.stop();
        player.handle(ControlMessage::OffsetIncrease).unwrap();
        assert_eq!(player.offset_ns(), 5_000_000);

        assert!(statuses
            .lock()
            .unwrap()
            .contains(&Status::OffsetChanged { offset_ns: 10_000_000 }));
    }

    #[test]
    fn chart_failure_aborts_start_before_any_session() {
        struct Broken(Vec<crate::chart::Tile>);

        impl ChartProvider for Broken {
            fn tiles(&self) -> &[crate::chart::Tile] {
                &self.0
            }
            fn time_at_beat(&self, beat: f64) -> Result<f64, ChartError> {
                Err(ChartError::NonFiniteBeat { beat })
            }
            fn beat_span_of_tile(&self, _index: usize) -> Result<f64, ChartError> {
                Ok(1.0)
            }
        }

        let (player, _, statuses) = player_with(Arc::new(ManualClock::new()));
        player.load_chart(Arc::new(Broken(vec![crate::chart::Tile::tap(0)])));

        let result = player.start();

        assert!(matches!(
            result,
            Err(PlayerError::Playback(PlaybackError::Chart(_)))
        ));
        assert_eq!(player.state(), PlayerState::Idle);
        assert!(!player.is_session_alive());
        assert!(matches!(statuses.lock().unwrap().last(), Some(Status::Error(_))));
    }

    #[test]
    fn injector_failure_returns_to_idle_with_error() {
        struct Unplugged;

        impl InputInjector for Unplugged {
            fn press(&mut self) -> Result<(), InjectError> {
                Err(InjectError::Unavailable("no keyboard".into()))
            }
            fn release(&mut self) -> Result<(), InjectError> {
                Ok(())
            }
        }

        let statuses: Statuses = Default::default();
        let player = Player::new(
            PlayerConfig::default(),
            Arc::new(ManualClock::new()),
            Unplugged,
            statuses.clone(),
        );
        player.load_chart(two_tile_chart());

        player.start().unwrap();
        wait_for_idle(&player);

        assert_eq!(player.state(), PlayerState::Idle);
        let last = statuses.lock().unwrap().last().cloned();
        assert!(matches!(last, Some(Status::Error(msg)) if msg.contains("no keyboard")));
    }

    #[test]
    fn empty_chart_is_a_valid_no_op_run() {
        let (player, injector, statuses) = player_with(Arc::new(ManualClock::new()));
        player.load_chart(Arc::new(TempoChart::builder(120.0).build().unwrap()));

        player.start().unwrap();
        wait_for_idle(&player);

        assert!(injector.events().is_empty());
        assert!(matches!(statuses.lock().unwrap().last(), Some(Status::Finished(_))));
    }

    #[test]
    fn shutdown_leaves_no_running_loop() {
        let (player, injector, _) = player_with(Arc::new(MonotonicClock::new()));
        player.load_chart(two_tile_chart());
        player.start().unwrap();

        player.shutdown();

        assert_eq!(player.state(), PlayerState::Idle);
        wait_for_idle(&player);
        assert!(injector.events().is_empty());
    }
}
