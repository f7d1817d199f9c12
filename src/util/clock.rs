//! Time sources for the scheduling loop and the occupancy threads.
//!
//! Every timestamp in the crate is a [`Duration`] measured from the clock's
//! origin. [`SystemClock`] follows wall time; [`VirtualClock`] only moves when
//! it is told to, which makes whole runs reproducible in tests.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Real-time granularity used by threads parked on a [`VirtualClock`].
const VIRTUAL_PARK_GRANULARITY: Duration = Duration::from_millis(1);

/// Clock shared between the driver and the occupancy threads.
pub type SharedClock = Arc<dyn Clock>;

/// A monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Time elapsed since the clock origin.
    fn now(&self) -> Duration;

    /// Block the scheduling loop for `period`.
    fn sleep(&self, period: Duration);

    /// How long a hold thread should wait on its condvar before re-reading
    /// [`Clock::now`], given `remaining` time until its deadline.
    fn park_timeout(&self, remaining: Duration) -> Duration;
}

/// Wall-clock time source anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Convenience constructor for the shared form.
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, period: Duration) {
        std::thread::sleep(period);
    }

    fn park_timeout(&self, remaining: Duration) -> Duration {
        remaining
    }
}

/// Advance-on-demand clock for deterministic runs.
///
/// `sleep` advances virtual time instead of blocking, so a driver loop over a
/// virtual clock executes the same sequence of passes on every run.
///
/// ```
/// use std::time::Duration;
/// use sjf_exam_sim::util::{Clock, VirtualClock};
///
/// let clock = VirtualClock::new();
/// clock.advance(Duration::from_millis(5));
/// clock.sleep(Duration::from_millis(5));
/// assert_eq!(clock.now(), Duration::from_millis(10));
/// ```
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Mutex<Duration>,
}

impl VirtualClock {
    /// Create a virtual clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning both the concrete handle and the
    /// shared trait object pointing at the same clock.
    #[must_use]
    pub fn shared() -> (Arc<Self>, SharedClock) {
        let clock = Arc::new(Self::new());
        let shared: SharedClock = clock.clone();
        (clock, shared)
    }

    /// Move virtual time forward.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(delta);
    }

    /// Jump to an absolute instant; ignored if it lies in the past.
    pub fn set(&self, at: Duration) {
        let mut now = self.now.lock();
        if at > *now {
            *now = at;
        }
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }

    fn sleep(&self, period: Duration) {
        self.advance(period);
    }

    fn park_timeout(&self, remaining: Duration) -> Duration {
        remaining.min(VIRTUAL_PARK_GRANULARITY)
    }
}
