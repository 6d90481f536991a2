//! Rebuild scheduling: an injectable [Clock] and the leading-edge [Debouncer] that decides
//! when a burst of index events turns into a rebuild.
use parking_lot::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new(UNIX_EPOCH + Duration::from_secs(1))
    }
}

impl ManualClock {
    pub fn new(start: SystemTime) -> ManualClock {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) -> SystemTime {
        let mut now = self.now.lock();
        *now += by;
        *now
    }

    pub fn set(&self, to: SystemTime) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

/// Leading-edge debouncer with a resetting cooldown.
///
/// The first event of a burst fires. Every later event restarts the cooldown, fired or not, so
/// a steady stream of events fires once and is then absorbed until the stream goes quiet for a
/// whole cooldown.
#[derive(Debug, Clone)]
pub struct Debouncer {
    cooldown: Duration,
    last_event: Option<SystemTime>,
    absorbed: usize,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Debouncer {
        Debouncer {
            cooldown,
            last_event: None,
            absorbed: 0,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Register an event at `now`; returns true when it should fire.
    pub fn trigger(&mut self, now: SystemTime) -> bool {
        let fire = match self.last_event {
            None => true,
            Some(last) => match now.duration_since(last) {
                Ok(quiet) => quiet >= self.cooldown,
                // Clock went backwards
                Err(_) => true,
            },
        };
        self.last_event = Some(now);
        if fire {
            self.absorbed = 0;
        } else {
            self.absorbed += 1;
            tracing::trace!(
                "[Debouncer::trigger] absorbed event ({} since last fire)",
                self.absorbed
            );
        }
        fire
    }

    /// Events absorbed since the last fire.
    pub fn absorbed(&self) -> usize {
        self.absorbed
    }

    /// True once, after events were absorbed and the stream has been quiet for a whole
    /// cooldown, so the tail of a burst still reaches the index.
    pub fn take_settled(&mut self, now: SystemTime) -> bool {
        let quiet = match self.last_event {
            Some(last) => now
                .duration_since(last)
                .map(|quiet| quiet >= self.cooldown)
                .unwrap_or(true),
            None => false,
        };
        if self.absorbed > 0 && quiet {
            self.absorbed = 0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.last_event = None;
        self.absorbed = 0;
    }
}
