//! Per-connection input rate limiting

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Messages per second a client may send. Inputs arrive once per 20 Hz
/// tick, so this leaves room for bursts after a stall.
pub const INPUT_RATE_LIMIT: u32 = 60;

/// Input limiter owned by one WebSocket reader
pub struct PlayerRateLimiter {
    limiter: DirectLimiter,
}

impl PlayerRateLimiter {
    pub fn new() -> Self {
        Self::per_second(INPUT_RATE_LIMIT)
    }

    pub fn per_second(rate: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(rate).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    /// True if another input message is allowed right now
    pub fn check_input(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for PlayerRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
