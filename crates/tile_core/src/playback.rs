//! Playback state for step-by-step generation.
//!
//! Converts host frame time into a number of due scheduler steps, and
//! carries the play/pause and completion flags.

use std::time::Duration;

/// Upper bound on steps released by a single `advance`, so a long stall in
/// the host does not turn into one huge burst.
pub const MAX_STEPS_PER_ADVANCE: usize = 10_000;

/// Playback state for step-by-step generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// Whether generation is currently playing (auto-advancing).
    pub playing: bool,
    /// Time between two steps. Zero means one step per `advance`.
    pub tick_interval: Duration,
    /// Time not yet spent on a step.
    pub accumulator: Duration,
    /// Whether generation has completed.
    pub completed: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            playing: false,
            tick_interval: Duration::from_millis(10),
            accumulator: Duration::ZERO,
            completed: false,
        }
    }
}

impl PlaybackState {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            ..Default::default()
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn play(&mut self) {
        if !self.completed {
            self.playing = true;
        }
    }

    /// Reset to initial state. The tick interval is kept.
    pub fn reset(&mut self) {
        self.playing = false;
        self.accumulator = Duration::ZERO;
        self.completed = false;
    }

    /// Mark as completed.
    pub fn complete(&mut self) {
        self.completed = true;
        self.playing = false;
    }

    pub fn set_tick_interval(&mut self, tick_interval: Duration) {
        self.tick_interval = tick_interval;
    }

    /// Feed `elapsed` host time and return how many steps are now due.
    ///
    /// Every full tick interval in the accumulator releases one step; the
    /// remainder carries over to the next call.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        if !self.playing || self.completed {
            return 0;
        }

        if self.tick_interval.is_zero() {
            return 1;
        }

        self.accumulator += elapsed;
        let interval = self.tick_interval.as_nanos();
        let due = self.accumulator.as_nanos() / interval;
        let spent = interval * due;
        self.accumulator = Duration::from_nanos((self.accumulator.as_nanos() - spent) as u64);
        (due as usize).min(MAX_STEPS_PER_ADVANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let state = PlaybackState::default();
        assert!(!state.playing);
        assert_eq!(state.tick_interval, Duration::from_millis(10));
        assert!(!state.completed);
    }

    #[test]
    fn test_paused_releases_nothing() {
        let mut state = PlaybackState::new(Duration::from_millis(5));
        assert_eq!(state.advance(Duration::from_millis(100)), 0);
        assert_eq!(state.accumulator, Duration::ZERO);
    }

    #[test]
    fn test_advance_carries_remainder() {
        let mut state = PlaybackState::new(Duration::from_millis(10));
        state.play();
        assert_eq!(state.advance(Duration::from_millis(25)), 2);
        assert_eq!(state.accumulator, Duration::from_millis(5));
        assert_eq!(state.advance(Duration::from_millis(4)), 0);
        assert_eq!(state.advance(Duration::from_millis(1)), 1);
        assert_eq!(state.accumulator, Duration::ZERO);
    }

    #[test]
    fn test_zero_interval_steps_every_advance() {
        let mut state = PlaybackState::new(Duration::ZERO);
        state.play();
        assert_eq!(state.advance(Duration::ZERO), 1);
        assert_eq!(state.advance(Duration::from_secs(1)), 1);
    }

    #[test]
    fn test_completed_stops_playback() {
        let mut state = PlaybackState::new(Duration::from_millis(1));
        state.play();
        state.complete();
        assert!(!state.playing);
        state.play();
        assert!(!state.playing);
        assert_eq!(state.advance(Duration::from_millis(50)), 0);
    }

    #[test]
    fn test_reset() {
        let mut state = PlaybackState::new(Duration::from_millis(3));
        state.completed = true;
        state.playing = true;
        state.accumulator = Duration::from_millis(2);
        state.reset();
        assert_eq!(state.accumulator, Duration::ZERO);
        assert!(!state.completed);
        assert!(!state.playing);
        assert_eq!(state.tick_interval, Duration::from_millis(3));
    }
}
