use super::error::{ModifierError, ModifierResult};
use crate::game::types::Seconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    /// Terminal. `elapsed == duration`.
    Completed,
}

/// Countdown carried by timed modifiers.
///
/// The owning collection drives it: `advance` is only called on the fixed tick of an
/// entity under local control, and the completion hook fires on the single call that
/// returns `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierTimer {
    duration: Seconds,
    elapsed: Seconds,
    state: TimerState,
    auto_start: bool,
    remove_on_complete: bool,
}

impl ModifierTimer {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: Seconds::new(duration),
            elapsed: Seconds::ZERO,
            state: TimerState::Idle,
            auto_start: true,
            remove_on_complete: true,
        }
    }

    /// Start counting as soon as the modifier is attached to a locally controlled entity.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Detach the modifier from its collection once the countdown completes.
    pub fn with_remove_on_complete(mut self, remove: bool) -> Self {
        self.remove_on_complete = remove;
        self
    }

    /// Idle -> Running.
    pub fn start(&mut self) -> ModifierResult<()> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                Ok(())
            }
            TimerState::Running => Err(ModifierError::TimerAlreadyStarted),
            TimerState::Completed => Err(ModifierError::TimerCompleted),
        }
    }

    /// Advance a running timer by `dt`. Returns `true` exactly once, on the call that
    /// moves it into `Completed`.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.elapsed = self.elapsed.inc_clamped(dt, self.duration);
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.state = TimerState::Completed;
            return true;
        }
        false
    }

    pub fn duration(&self) -> f32 {
        self.duration.0
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed.0
    }

    /// `duration - elapsed`, never negative.
    pub fn remaining(&self) -> f32 {
        self.duration.saturating_sub(self.elapsed).0
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == TimerState::Completed
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn remove_on_complete(&self) -> bool {
        self.remove_on_complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timer_does_not_advance() {
        let mut timer = ModifierTimer::new(3.0);
        assert!(!timer.advance(1.0));
        assert_eq!(timer.elapsed(), 0.0);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn completes_exactly_once_and_clamps() {
        let mut timer = ModifierTimer::new(2.5);
        timer.start().unwrap();

        let completions: Vec<bool> = (0..6).map(|_| timer.advance(1.0)).collect();
        assert_eq!(completions, vec![false, false, true, false, false, false]);
        assert_eq!(timer.elapsed(), 2.5);
        assert_eq!(timer.remaining(), 0.0);
        assert!(timer.is_complete());
        assert!(!timer.is_running());
    }

    #[test]
    fn elapsed_stays_in_bounds_for_uneven_ticks() {
        let mut timer = ModifierTimer::new(1.0);
        timer.start().unwrap();
        for dt in [0.3, 0.0, 0.45, 0.9, 0.1] {
            timer.advance(dt);
            assert!(timer.elapsed() >= 0.0 && timer.elapsed() <= timer.duration());
            assert!(timer.remaining() >= 0.0);
        }
        assert!(timer.is_complete());
    }

    #[test]
    fn start_is_rejected_outside_idle() {
        let mut timer = ModifierTimer::new(1.0);
        timer.start().unwrap();
        assert_eq!(timer.start(), Err(ModifierError::TimerAlreadyStarted));
        timer.advance(1.0);
        assert_eq!(timer.start(), Err(ModifierError::TimerCompleted));
    }

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let mut timer = ModifierTimer::new(0.0).with_remove_on_complete(false);
        timer.start().unwrap();
        assert!(timer.advance(0.02));
        assert!(!timer.remove_on_complete());
    }
}
