use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};

use autocat::{
    ChartProvider, Clock, ControlMessage, EventKind, InjectError, InputInjector, ManualClock,
    MonotonicClock, Player, PlayerConfig, PlayerError, PlayerState, Status, TempoChart,
};

const MS: i64 = 1_000_000;

type Log = Arc<Mutex<Vec<(i64, EventKind)>>>;

/// Injector that timestamps every call with the player's clock.
struct ClockedInjector {
    clock: Arc<dyn Clock>,
    log: Log,
    after_first_press: Option<Box<dyn FnMut() + Send>>,
}

impl ClockedInjector {
    fn new(clock: Arc<dyn Clock>, log: Log) -> Self {
        Self {
            clock,
            log,
            after_first_press: None,
        }
    }

    fn record(&mut self, kind: EventKind) {
        self.log.lock().unwrap().push((self.clock.now_ns(), kind));
    }
}

impl InputInjector for ClockedInjector {
    fn press(&mut self) -> Result<(), InjectError> {
        self.record(EventKind::Press);
        if let Some(mut hook) = self.after_first_press.take() {
            hook();
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), InjectError> {
        self.record(EventKind::Release);
        Ok(())
    }
}

fn wait_until_idle(player: &Player) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while player.is_session_alive() || player.state() != PlayerState::Idle {
        assert!(Instant::now() < deadline, "playback never finished");
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// 100 beats per second: one beat every 10ms, countdown of 40ms
fn fast_taps(tiles: usize) -> Arc<dyn ChartProvider> {
    let mut builder = TempoChart::builder(6000.0).title("fast");
    for _ in 0..tiles {
        builder = builder.tap(1.0);
    }
    Arc::new(builder.build().unwrap())
}

#[test]
fn two_offset_increases_shift_only_undispatched_events() {
    let clock = ManualClock::new();
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let log: Log = Default::default();

    // the injector reaches back into the player, as a hotkey listener would
    let player_slot: Arc<OnceLock<Weak<Player>>> = Arc::new(OnceLock::new());
    let mut injector = ClockedInjector::new(Arc::clone(&shared_clock), Arc::clone(&log));
    let slot = Arc::clone(&player_slot);
    injector.after_first_press = Some(Box::new(move || {
        if let Some(player) = slot.get().and_then(Weak::upgrade) {
            player.handle(ControlMessage::OffsetIncrease).unwrap();
            player.handle(ControlMessage::OffsetIncrease).unwrap();
        }
    }));

    let statuses = Arc::new(Mutex::new(Vec::new()));
    let player = Arc::new(Player::new(
        PlayerConfig::default(),
        shared_clock,
        injector,
        Arc::clone(&statuses),
    ));
    player_slot.set(Arc::downgrade(&player)).unwrap();

    // 120 BPM: tap on beat 0, one-beat hold on beat 1, 2s countdown
    let chart = TempoChart::builder(120.0)
        .tap(1.0)
        .hold(1.0, 1.0)
        .build()
        .unwrap();
    player.load_chart(Arc::new(chart));

    player.handle(ControlMessage::TogglePlayback).unwrap();
    wait_until_idle(&player);

    use EventKind::*;
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            (2000 * MS, Press),
            (2020 * MS, Release),
            (2510 * MS, Press),
            (3010 * MS, Release),
        ]
    );
    assert_eq!(player.offset_ns(), 10 * MS);
    assert!(statuses
        .lock()
        .unwrap()
        .contains(&Status::OffsetChanged { offset_ns: 10 * MS }));
}

#[test]
fn starting_without_a_chart_creates_no_session() {
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let player = Player::new(
        PlayerConfig::default(),
        Arc::new(MonotonicClock::new()),
        autocat::RecordingInjector::new(),
        Arc::clone(&statuses),
    );

    let result = player.handle(ControlMessage::TogglePlayback);

    assert!(matches!(result, Err(PlayerError::ChartUnavailable)));
    assert!(!player.is_session_alive());
    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(*statuses.lock().unwrap(), vec![Status::ChartUnavailable]);
}

#[test]
fn real_clock_run_dispatches_in_order_and_on_schedule() {
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let log: Log = Default::default();
    let player = Player::new(
        PlayerConfig::default(),
        Arc::clone(&clock),
        ClockedInjector::new(Arc::clone(&clock), Arc::clone(&log)),
        autocat::status::NullSink,
    );
    player.load_chart(fast_taps(4));

    let started = clock.now_ns();
    player.start().unwrap();
    wait_until_idle(&player);

    let log = log.lock().unwrap();
    let kinds: Vec<_> = log.iter().map(|(_, kind)| *kind).collect();
    use EventKind::*;
    assert_eq!(
        kinds,
        vec![Press, Release, Press, Release, Press, Release, Press, Release]
    );

    // the last release is due 40ms countdown + 30ms + 10ms tap after start
    let (last_ns, _) = log[log.len() - 1];
    assert!(last_ns - started >= 80 * MS);
    for pair in log.windows(2) {
        assert!(pair[0].0 <= pair[1].0);
    }
}

#[test]
fn stop_mid_run_silences_the_injector() {
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
    let log: Log = Default::default();
    let player = Player::new(
        PlayerConfig::default(),
        Arc::clone(&clock),
        ClockedInjector::new(Arc::clone(&clock), Arc::clone(&log)),
        autocat::status::NullSink,
    );
    // 200 tiles: two seconds of tapping
    player.load_chart(fast_taps(200));

    player.handle(ControlMessage::TogglePlayback).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    player.handle(ControlMessage::TogglePlayback).unwrap();

    assert_eq!(player.state(), PlayerState::Idle);
    let at_stop = log.lock().unwrap().len();
    assert!(at_stop > 0 && at_stop < 400);

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(log.lock().unwrap().len(), at_stop);
    assert!(!player.is_session_alive());
}

#[test]
fn toggle_restarts_after_a_finished_run() {
    let clock = ManualClock::new();
    let log: Log = Default::default();
    let player = Player::new(
        PlayerConfig::default().countdown_beats(0.0),
        Arc::new(clock.clone()),
        ClockedInjector::new(Arc::new(clock.clone()), Arc::clone(&log)),
        autocat::status::NullSink,
    );
    player.load_chart(fast_taps(3));

    player.handle(ControlMessage::TogglePlayback).unwrap();
    wait_until_idle(&player);
    player.handle(ControlMessage::TogglePlayback).unwrap();
    wait_until_idle(&player);

    assert_eq!(log.lock().unwrap().len(), 12);
}
