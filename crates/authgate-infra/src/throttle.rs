//! Per-address request throttle using governor's keyed GCRA limiter.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Result of one throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Throttled { retry_after: Duration },
}

/// In-process flood guard keyed by client address.
///
/// Independent of the attempt ledger: it counts requests, not failures,
/// and is per-process.
pub struct RequestThrottle {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
    per_minute: NonZeroU32,
}

impl RequestThrottle {
    pub fn new(per_minute: NonZeroU32) -> Self {
        let quota = Quota::per_minute(per_minute);

        Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
            per_minute,
        }
    }

    pub fn per_minute(&self) -> u32 {
        self.per_minute.get()
    }

    pub fn check(&self, address: &str) -> ThrottleDecision {
        match self.limiter.check_key(&address.to_string()) {
            Ok(()) => ThrottleDecision::Allowed,
            Err(not_until) => ThrottleDecision::Throttled {
                retry_after: not_until.wait_time_from(self.clock.now()),
            },
        }
    }

    /// Drop state for addresses whose quota has fully replenished.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }
}
