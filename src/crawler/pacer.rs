//! Request pacing
//!
//! Every fetch of a run waits for a random delay drawn uniformly from the
//! configured range. A `Crawl-delay` declared by the site raises the lower
//! bound for the rest of the run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Randomized inter-request delay
#[derive(Debug, Clone)]
pub struct Pacer<R = StdRng> {
    min_delay: Duration,
    max_delay: Duration,
    rng: R,
}

impl Pacer<StdRng> {
    /// Creates a pacer seeded from the operating system
    pub fn new(min_delay_seconds: f64, max_delay_seconds: f64) -> Self {
        Self::with_rng(min_delay_seconds, max_delay_seconds, StdRng::from_os_rng())
    }

    /// Creates a reproducible pacer
    pub fn seeded(min_delay_seconds: f64, max_delay_seconds: f64, seed: u64) -> Self {
        Self::with_rng(min_delay_seconds, max_delay_seconds, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Pacer<R> {
    /// Creates a pacer drawing delays from `rng`
    ///
    /// An inverted range is widened so that `max >= min`.
    pub fn with_rng(min_delay_seconds: f64, max_delay_seconds: f64, rng: R) -> Self {
        let min_delay = seconds(min_delay_seconds);
        let max_delay = seconds(max_delay_seconds).max(min_delay);
        Self {
            min_delay,
            max_delay,
            rng,
        }
    }

    /// Raises the minimum delay to the policy's declared floor
    ///
    /// A floor above the configured maximum lifts the maximum too. A floor
    /// below the current minimum changes nothing.
    pub fn apply_policy_floor(&mut self, floor_seconds: f64) {
        let floor = seconds(floor_seconds);
        if floor <= self.min_delay {
            return;
        }

        tracing::info!(
            floor_seconds,
            configured_min_seconds = self.min_delay.as_secs_f64(),
            "Crawl policy raises the minimum delay"
        );
        self.min_delay = floor;
        self.max_delay = self.max_delay.max(floor);
    }

    /// Returns the current `(min, max)` delay bounds
    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min_delay, self.max_delay)
    }

    /// Draws the next delay without sleeping
    pub fn next_delay(&mut self) -> Duration {
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }

        let min = nanos(self.min_delay);
        let max = nanos(self.max_delay);
        Duration::from_nanos(self.rng.random_range(min..=max))
    }

    /// Sleeps for the next delay and returns how long it waited
    pub async fn wait(&mut self) -> Duration {
        let delay = self.next_delay();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Rate limiting before next request");
        tokio::time::sleep(delay).await;
        delay
    }
}

/// Converts a seconds value to a Duration, treating invalid values as zero
fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
