//! Gain ramps.
//!
//! A ramp is one scheduled interpolation of gain from a start value to a
//! target over a wall-clock duration. Ramps are passive: nothing advances
//! them in the background. Callers evaluate them against `Instant::now()`
//! whenever a value is needed, so scheduling and playback stay decoupled.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Floor for exponential ramp endpoints. An exponential approach to exactly
/// zero is undefined, so endpoints at or below this value are lifted to it
/// for the curve math; completion still snaps to the exact requested target.
pub const MIN_AUDIBLE_GAIN: f32 = 0.001;

/// Shape of a gain transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampCurve {
    /// Straight-line interpolation between the endpoints.
    Linear,

    /// Constant-ratio interpolation; perceptually smoother for fades to and
    /// from near-silence.
    Exponential,
}

impl Default for RampCurve {
    fn default() -> Self {
        RampCurve::Linear
    }
}

/// A single in-flight gain transition.
#[derive(Debug, Clone, Copy)]
pub struct GainRamp {
    from: f32,
    target: f32,
    curve: RampCurve,
    started_at: Instant,
    duration: Duration,
}

impl GainRamp {
    /// Create a ramp starting at `now`. Both endpoints are clamped to [0, 1].
    pub fn new(from: f32, target: f32, duration: Duration, curve: RampCurve, now: Instant) -> Self {
        Self {
            from: from.clamp(0.0, 1.0),
            target: target.clamp(0.0, 1.0),
            curve,
            started_at: now,
            duration,
        }
    }

    /// The requested end value of the ramp.
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= self.duration
    }

    /// Gain at `now`, clamped to [0, 1]. Completed ramps report the exact
    /// target, including 0.0 for exponential fades to silence.
    pub fn value_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() || self.is_complete(now) {
            return self.target;
        }

        let progress =
            now.duration_since(self.started_at).as_secs_f32() / self.duration.as_secs_f32();

        let value = match self.curve {
            RampCurve::Linear => self.from + (self.target - self.from) * progress,
            RampCurve::Exponential => {
                let from = self.from.max(MIN_AUDIBLE_GAIN);
                let target = self.target.max(MIN_AUDIBLE_GAIN);
                from * (target / from).powf(progress)
            }
        };

        value.clamp(0.0, 1.0)
    }
}

/// Current gain plus at most one active ramp.
///
/// Scheduling a new ramp always cancels the in-flight one first: the new
/// ramp starts from whatever value the old one had reached, and the last
/// scheduled ramp wins. There is no ramp queueing.
#[derive(Debug, Clone)]
pub struct GainEnvelope {
    current: f32,
    ramp: Option<GainRamp>,
    curve: RampCurve,
}

impl GainEnvelope {
    /// Create an envelope at gain 0 (silent).
    pub fn new(curve: RampCurve) -> Self {
        Self {
            current: 0.0,
            ramp: None,
            curve,
        }
    }

    /// Schedule a smooth transition from the present value to `target`.
    pub fn ramp_to(&mut self, target: f32, duration: Duration, now: Instant) {
        let from = self.value(now);
        self.ramp = Some(GainRamp::new(from, target, duration, self.curve, now));
    }

    /// Jump to `value` without a ramp, cancelling any in-flight ramp.
    pub fn set_immediate(&mut self, value: f32) {
        self.ramp = None;
        self.current = value.clamp(0.0, 1.0);
    }

    /// Gain at `now`. Completed ramps are committed and dropped.
    pub fn value(&mut self, now: Instant) -> f32 {
        if let Some(ramp) = self.ramp {
            if ramp.is_complete(now) {
                self.current = ramp.target();
                self.ramp = None;
            } else {
                self.current = ramp.value_at(now);
            }
        }
        self.current
    }

    /// The gain this envelope is heading toward (the ramp target, or the
    /// current value when no ramp is active).
    pub fn target(&self) -> f32 {
        match &self.ramp {
            Some(ramp) => ramp.target(),
            None => self.current,
        }
    }
}
