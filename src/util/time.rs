//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 20; // 20 ticks per second
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Upper bound on a single integration step (seconds)
pub const MAX_TICK_DELTA: f64 = 0.1;

/// Nominal tick period
pub fn tick_period() -> Duration {
    Duration::from_micros(TICK_DURATION_MICROS)
}

/// Nominal delta time for one tick (in seconds)
pub fn tick_delta() -> f64 {
    1.0 / SIMULATION_TPS as f64
}

/// Delta time between two ticks, capped at [`MAX_TICK_DELTA`]
pub fn bounded_delta(last: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(last)
        .as_secs_f64()
        .min(MAX_TICK_DELTA)
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_delta_caps_stalls() {
        let last = Instant::now();
        let now = last + Duration::from_secs(5);
        assert_eq!(bounded_delta(last, now), MAX_TICK_DELTA);
    }

    #[test]
    fn bounded_delta_passes_normal_ticks() {
        let last = Instant::now();
        let now = last + Duration::from_millis(50);
        assert!((bounded_delta(last, now) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn bounded_delta_never_negative() {
        let now = Instant::now();
        let later = now + Duration::from_millis(10);
        assert_eq!(bounded_delta(later, now), 0.0);
    }

    #[test]
    fn tick_period_matches_rate() {
        assert_eq!(tick_period(), Duration::from_millis(50));
        assert!((tick_delta() - 0.05).abs() < 1e-12);
    }
}
