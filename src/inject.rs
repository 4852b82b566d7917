//! Input injection - the one place a scheduled event touches the outside world

use crate::error::InjectError;
use crate::timeline::EventKind;

/// Drives the modeled input up and down.
///
/// Only the dispatch loop calls into an injector. Each call should return
/// quickly; the scheduler treats injection as instantaneous.
pub trait InputInjector: Send {
    /// The input is now physically down
    fn press(&mut self) -> Result<(), InjectError>;

    /// The input is now physically up
    fn release(&mut self) -> Result<(), InjectError>;

    /// Dispatch by event kind
    fn inject(&mut self, kind: EventKind) -> Result<(), InjectError> {
        match kind {
            EventKind::Press => self.press(),
            EventKind::Release => self.release(),
        }
    }
}

impl<T: InputInjector + ?Sized> InputInjector for Box<T> {
    fn press(&mut self) -> Result<(), InjectError> {
        (**self).press()
    }

    fn release(&mut self) -> Result<(), InjectError> {
        (**self).release()
    }
}

/// Injector that remembers every call, for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct RecordingInjector {
    events: Vec<EventKind>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[EventKind] {
        &self.events
    }

    /// True when the last recorded call left the input down
    pub fn is_down(&self) -> bool {
        self.events.last() == Some(&EventKind::Press)
    }
}

impl InputInjector for RecordingInjector {
    fn press(&mut self) -> Result<(), InjectError> {
        self.events.push(EventKind::Press);
        Ok(())
    }

    fn release(&mut self) -> Result<(), InjectError> {
        self.events.push(EventKind::Release);
        Ok(())
    }
}
