//! Millisecond time source for the settle delay

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Monotonic enough millisecond clock
pub trait Clock: fmt::Debug {
    fn now_ms(&self) -> u64;
}

/// `Date.now()` in the browser; elsewhere a monotonic `Instant` counted
/// from the first reading in the process
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        #[cfg(target_arch = "wasm32")]
        {
            js_sys::Date::now() as u64
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::sync::OnceLock;
            use std::time::Instant;

            static ANCHOR: OnceLock<Instant> = OnceLock::new();
            ANCHOR.get_or_init(Instant::now).elapsed().as_millis() as u64
        }
    }
}

/// Hand-driven clock. Clones share the same time, so a test can keep one
/// handle and give the other to the controller.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(30);
        handle.advance(25);
        assert_eq!(clock.now_ms(), 55);
        handle.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
        // counted from process start, not from the epoch
        assert!(b < 1_000_000_000);
    }
}
