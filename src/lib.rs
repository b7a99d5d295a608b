//! Focusmix: a focus/break interval timer driving a layered ambient-sound
//! mixer.
//!
//! The crate is built from small, caller-driven pieces: [`timer::PhaseTimer`]
//! is a countdown state machine ticked once per second,
//! [`mixer::AudioMixer`] owns every sound channel and ramps their gains
//! against wall-clock time, and [`orchestrator::Orchestrator`] wires timer
//! transitions to mixer reactions (chime, cross-fade) and display updates.

pub mod config;
pub mod display;
pub mod error;
pub mod mixer;
pub mod orchestrator;
pub mod timer;

pub use config::Config;
pub use display::{format_remaining, ConsoleDisplay, StatusDisplay};
pub use error::{AppResult, ConfigError, MixerError, TimerError};
pub use mixer::{AudioMixer, GainEnvelope, GainRamp, RampCurve, TrackQueue, MIN_AUDIBLE_GAIN};
pub use orchestrator::{Command, Orchestrator};
pub use timer::{Phase, PhaseTimer, TimerEvent};
