/// A fixed-rate mission clock.
///
/// `dt_seconds` is derived once from `tick_rate` and never recomputed, so
/// repeated `advance()` calls accumulate identically across runs. GET is
/// tracked both as a running sum (for cheap reads) and reconcilable against
/// `tick_count * dt_seconds` (see `tests`) to catch drift early.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    current_get_seconds: f64,
    tick_rate_hz: u32,
    dt_seconds: f64,
    tick_count: u64,
}

impl SimulationClock {
    /// Creates a clock starting at GET 0 with the given tick rate in Hz.
    ///
    /// # Panics
    /// Panics if `tick_rate_hz` is zero; a zero-rate clock is a programmer
    /// error, not a runtime condition (there is no sensible `dt_seconds`).
    #[must_use]
    pub fn new(tick_rate_hz: u32) -> Self {
        assert!(tick_rate_hz > 0, "tick rate must be positive");
        Self {
            current_get_seconds: 0.0,
            tick_rate_hz,
            dt_seconds: 1.0 / f64::from(tick_rate_hz),
            tick_count: 0,
        }
    }

    /// Creates a clock already positioned at `start_get_seconds`, used when
    /// resuming a run from a known GET.
    #[must_use]
    pub fn starting_at(tick_rate_hz: u32, start_get_seconds: f64) -> Self {
        let mut clock = Self::new(tick_rate_hz);
        clock.current_get_seconds = start_get_seconds;
        clock
    }

    /// The current Ground Elapsed Time in seconds.
    #[must_use]
    pub fn get_seconds(&self) -> f64 { self.current_get_seconds }

    /// The fixed timestep in seconds, `1 / tick_rate_hz`.
    #[must_use]
    pub fn dt_seconds(&self) -> f64 { self.dt_seconds }

    /// The configured tick rate in Hz.
    #[must_use]
    pub fn tick_rate_hz(&self) -> u32 { self.tick_rate_hz }

    /// The number of ticks advanced since construction.
    #[must_use]
    pub fn tick_count(&self) -> u64 { self.tick_count }

    /// Advances GET by exactly `dt_seconds` and increments the tick counter.
    pub fn advance(&mut self) {
        self.tick_count += 1;
        self.current_get_seconds += self.dt_seconds;
    }

    /// The GET the clock would reach after `ticks` more advances, without
    /// mutating state. Used by the kernel to decide whether one more tick
    /// would overshoot `until_get_seconds`.
    #[must_use]
    pub fn peek_after(&self, ticks: u64) -> f64 {
        self.current_get_seconds + (ticks as f64) * self.dt_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::SimulationClock;

    #[test]
    fn advances_by_exact_dt_and_matches_count_times_dt() {
        let mut clock = SimulationClock::new(20);
        for _ in 0..10 {
            clock.advance();
        }
        assert_eq!(clock.tick_count(), 10);
        let expected = 10.0 * clock.dt_seconds();
        assert!((clock.get_seconds() - expected).abs() < 1e-12);
        assert!((clock.get_seconds() - 0.5).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "tick rate must be positive")]
    fn rejects_zero_tick_rate() {
        let _ = SimulationClock::new(0);
    }
}
