//! Layered ambient-sound mixing.
//!
//! A mixer owns a registry of independently loaded, loopable channels, a
//! notification chime, and an optional shuffled music playlist. Channel
//! volume changes are smooth ramps evaluated against wall-clock time.

pub mod channel;
pub mod manager;
pub mod playlist;
pub mod ramp;

pub use channel::GainChannel;
pub use manager::AudioMixer;
pub use playlist::{ShufflePlaylist, TrackQueue};
pub use ramp::{GainEnvelope, GainRamp, RampCurve, MIN_AUDIBLE_GAIN};
