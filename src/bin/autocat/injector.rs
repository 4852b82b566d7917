//! On-screen key lamp standing in for an OS-level key injector

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use autocat::{InjectError, InputInjector};

/// Key state shared between the playback thread and the UI
#[derive(Debug, Default)]
pub struct KeyLamp {
    down: AtomicBool,
    presses: AtomicU64,
}

impl KeyLamp {
    pub fn is_down(&self) -> bool {
        self.down.load(Ordering::Relaxed)
    }

    pub fn presses(&self) -> u64 {
        self.presses.load(Ordering::Relaxed)
    }
}

/// Injector that lights the lamp instead of synthesizing a keypress
pub struct LampInjector {
    lamp: Arc<KeyLamp>,
}

impl LampInjector {
    pub fn new(lamp: Arc<KeyLamp>) -> Self {
        Self { lamp }
    }
}

impl InputInjector for LampInjector {
    fn press(&mut self) -> Result<(), InjectError> {
        self.lamp.down.store(true, Ordering::Relaxed);
        let presses = self.lamp.presses.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!("press #{presses}");
        Ok(())
    }

    fn release(&mut self) -> Result<(), InjectError> {
        self.lamp.down.store(false, Ordering::Relaxed);
        log::trace!("release");
        Ok(())
    }
}
