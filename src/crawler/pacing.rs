//! Outbound request pacing

use std::fmt;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::{Instrument, debug_span};

/// Fixed-interval gate acquired before every outbound request
///
/// Lets one request through per interval. A single `Pacer` can be shared by
/// reference between concurrent fetches; they queue on the same limiter.
pub struct Pacer {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl Pacer {
    /// Allow one request per `interval`; a zero interval disables pacing
    pub fn new(interval: Duration) -> Self {
        Self {
            limiter: Quota::with_period(interval).map(RateLimiter::direct),
        }
    }

    /// A pacer that never waits
    pub fn unpaced() -> Self {
        Self { limiter: None }
    }

    /// Wait until the next request may be issued
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("pacer")).await;
        }
    }

    pub fn is_paced(&self) -> bool {
        self.limiter.is_some()
    }
}

impl fmt::Debug for Pacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pacer").field("paced", &self.is_paced()).finish()
    }
}
