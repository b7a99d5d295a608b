//! Focus/break countdown state machine.
//!
//! The timer is caller-driven: it owns no thread and no clock. The caller
//! invokes `tick()` once per second while the timer is running, and each
//! command returns the event it produced (if any) for the caller to react
//! to. Keeping the tick source outside the state machine makes it
//! impossible for two tick sources to exist for one timer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// The timer's current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn other(self) -> Phase {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::Break => "Break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Events produced by timer commands and ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started { phase: Phase, remaining_secs: u32 },
    Tick { phase: Phase, remaining_secs: u32 },
    PhaseChanged { phase: Phase, remaining_secs: u32 },
    Paused { phase: Phase, remaining_secs: u32 },
    Stopped { phase: Phase, remaining_secs: u32 },
}

/// Countdown state machine alternating between Focus and Break.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    phase: Phase,
    focus_secs: u32,
    break_secs: u32,
    remaining_secs: u32,
    running: bool,
}

impl PhaseTimer {
    pub const DEFAULT_FOCUS_SECS: u32 = 25 * 60;
    pub const DEFAULT_BREAK_SECS: u32 = 5 * 60;

    /// Create a stopped timer in the Focus phase at full duration.
    pub fn new(focus_secs: u32, break_secs: u32) -> Result<Self, TimerError> {
        if focus_secs == 0 || break_secs == 0 {
            return Err(TimerError::InvalidDuration {
                focus_secs,
                break_secs,
            });
        }
        Ok(Self {
            phase: Phase::Focus,
            focus_secs,
            break_secs,
            remaining_secs: focus_secs,
            running: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus_secs,
            Phase::Break => self.break_secs,
        }
    }

    /// Begin counting down. A no-op while already running, so a second
    /// start can never produce a double-speed countdown.
    pub fn start(&mut self) -> Option<TimerEvent> {
        if self.running {
            return None;
        }
        self.running = true;
        tracing::debug!(
            "Timer started: {} with {}s remaining",
            self.phase,
            self.remaining_secs
        );
        Some(TimerEvent::Started {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Suspend the countdown, keeping the remaining time.
    pub fn pause(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(TimerEvent::Paused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Cancel the countdown and reset remaining time to the current
    /// phase's full duration.
    pub fn stop(&mut self) -> Option<TimerEvent> {
        self.running = false;
        self.remaining_secs = self.duration_of(self.phase);
        Some(TimerEvent::Stopped {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Stop and return to the Focus phase at full duration.
    pub fn reset(&mut self) -> Option<TimerEvent> {
        self.running = false;
        self.phase = Phase::Focus;
        self.remaining_secs = self.focus_secs;
        Some(TimerEvent::Stopped {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Replace the phase durations.
    ///
    /// A running timer is stopped first, so a stale tick source can never
    /// race the new configuration. The timer resets to Focus at the new
    /// full duration.
    pub fn set_durations(&mut self, focus_secs: u32, break_secs: u32) -> Result<TimerEvent, TimerError> {
        if focus_secs == 0 || break_secs == 0 {
            return Err(TimerError::InvalidDuration {
                focus_secs,
                break_secs,
            });
        }
        self.running = false;
        self.focus_secs = focus_secs;
        self.break_secs = break_secs;
        self.phase = Phase::Focus;
        self.remaining_secs = focus_secs;
        tracing::debug!("Durations set: focus={focus_secs}s, break={break_secs}s");
        Ok(TimerEvent::Stopped {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `None` while not running. Reaching zero switches phase
    /// exactly once and resets remaining time to the new phase's duration.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.phase = self.phase.other();
            self.remaining_secs = self.duration_of(self.phase);
            tracing::info!("Phase changed to {}", self.phase);
            return Some(TimerEvent::PhaseChanged {
                phase: self.phase,
                remaining_secs: self.remaining_secs,
            });
        }
        Some(TimerEvent::Tick {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        })
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self {
            phase: Phase::Focus,
            focus_secs: Self::DEFAULT_FOCUS_SECS,
            break_secs: Self::DEFAULT_BREAK_SECS,
            remaining_secs: Self::DEFAULT_FOCUS_SECS,
            running: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_durations() {
        assert!(PhaseTimer::new(0, 300).is_err());
        assert!(PhaseTimer::new(1500, 0).is_err());
        assert!(PhaseTimer::new(1500, 300).is_ok());
    }

    #[test]
    fn test_default_durations_match_classic_pomodoro() {
        let timer = PhaseTimer::default();
        assert_eq!(timer.duration_of(Phase::Focus), 1500);
        assert_eq!(timer.duration_of(Phase::Break), 300);
        assert_eq!(timer.remaining_secs(), 1500);
        assert_eq!(timer.phase(), Phase::Focus);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_double_start_keeps_single_tick_rate() {
        let mut timer = PhaseTimer::new(100, 20).unwrap();

        assert!(timer.start().is_some());
        // The duplicate start is a no-op.
        assert!(timer.start().is_none());

        for _ in 0..10 {
            timer.tick();
        }
        // Exactly one decrement per tick despite two starts.
        assert_eq!(timer.remaining_secs(), 90);
    }

    #[test]
    fn test_tick_is_ignored_while_stopped() {
        let mut timer = PhaseTimer::new(100, 20).unwrap();
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_secs(), 100);
    }

    #[test]
    fn test_focus_expiry_switches_to_break_exactly_once() {
        let mut timer = PhaseTimer::new(1500, 300).unwrap();
        timer.start();

        let mut transitions = 0;
        for _ in 0..1500 {
            if let Some(TimerEvent::PhaseChanged { .. }) = timer.tick() {
                transitions += 1;
            }
        }

        assert_eq!(transitions, 1);
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.remaining_secs(), 300);
        assert!(timer.is_running());
    }

    #[test]
    fn test_phases_alternate() {
        let mut timer = PhaseTimer::new(3, 2).unwrap();
        timer.start();

        let mut phases = Vec::new();
        for _ in 0..10 {
            if let Some(TimerEvent::PhaseChanged { phase, .. }) = timer.tick() {
                phases.push(phase);
            }
        }

        assert_eq!(
            phases,
            vec![Phase::Break, Phase::Focus, Phase::Break, Phase::Focus]
        );
    }

    #[test]
    fn test_pause_keeps_remaining_time() {
        let mut timer = PhaseTimer::new(100, 20).unwrap();
        timer.start();
        for _ in 0..30 {
            timer.tick();
        }

        assert!(matches!(
            timer.pause(),
            Some(TimerEvent::Paused {
                remaining_secs: 70,
                ..
            })
        ));
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_secs(), 70);

        // Resume continues from where it left off.
        timer.start();
        timer.tick();
        assert_eq!(timer.remaining_secs(), 69);
    }

    #[test]
    fn test_stop_resets_to_current_phase_duration() {
        let mut timer = PhaseTimer::new(10, 4).unwrap();
        timer.start();
        // Run into the break phase.
        for _ in 0..12 {
            timer.tick();
        }
        assert_eq!(timer.phase(), Phase::Break);

        let event = timer.stop();
        assert!(matches!(
            event,
            Some(TimerEvent::Stopped {
                phase: Phase::Break,
                remaining_secs: 4,
            })
        ));
        assert!(!timer.is_running());
    }

    #[test]
    fn test_reset_returns_to_focus() {
        let mut timer = PhaseTimer::new(10, 4).unwrap();
        timer.start();
        for _ in 0..12 {
            timer.tick();
        }
        assert_eq!(timer.phase(), Phase::Break);

        timer.reset();
        assert_eq!(timer.phase(), Phase::Focus);
        assert_eq!(timer.remaining_secs(), 10);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_set_durations_stops_a_running_timer() {
        let mut timer = PhaseTimer::new(100, 20).unwrap();
        timer.start();
        for _ in 0..5 {
            timer.tick();
        }

        let event = timer.set_durations(50, 10).unwrap();
        assert!(matches!(
            event,
            TimerEvent::Stopped {
                phase: Phase::Focus,
                remaining_secs: 50,
            }
        ));
        assert!(!timer.is_running());
        // No stale tick source can decrement the new configuration.
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_secs(), 50);
    }

    #[test]
    fn test_set_durations_rejects_zero() {
        let mut timer = PhaseTimer::new(100, 20).unwrap();
        assert!(timer.set_durations(0, 20).is_err());
        // Configuration is untouched on failure.
        assert_eq!(timer.duration_of(Phase::Focus), 100);
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Focus.to_string(), "Focus");
        assert_eq!(Phase::Break.to_string(), "Break");
        assert_eq!(Phase::Focus.other(), Phase::Break);
    }
}
