//! One loopable ambient sound layer with its own volume envelope.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStreamHandle, Sink};

use super::ramp::{GainEnvelope, RampCurve};
use crate::error::MixerError;

/// A named, independently controllable looping sound layer.
///
/// Channels are registered unloaded. The first activation preloads the
/// asset into memory, verifies it decodes, and starts looped playback at
/// gain 0 so later fade-ins begin from a primed, glitch-free stream.
/// A muted channel keeps its decoded data and sink resident for instant
/// re-fade-in.
pub struct GainChannel {
    name: String,
    path: PathBuf,
    set_point: f32,
    envelope: GainEnvelope,
    audio_data: Option<Arc<Vec<u8>>>,
    sink: Option<Sink>,
    loaded: bool,
}

impl GainChannel {
    pub fn new(name: impl Into<String>, path: PathBuf, set_point: f32, curve: RampCurve) -> Self {
        Self {
            name: name.into(),
            path,
            set_point: set_point.clamp(0.0, 1.0),
            envelope: GainEnvelope::new(curve),
            audio_data: None,
            sink: None,
            loaded: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// True when the channel is loaded and heading toward an audible gain.
    pub fn is_audible(&self) -> bool {
        self.loaded && self.envelope.target() > 0.0
    }

    /// The persistent volume the channel returns to when toggled on.
    pub fn set_point(&self) -> f32 {
        self.set_point
    }

    pub fn set_set_point(&mut self, value: f32) {
        self.set_point = value.clamp(0.0, 1.0);
    }

    /// Preload and start looped playback at gain 0.
    ///
    /// Idempotent: calling again on a loaded channel is a no-op. On failure
    /// the channel stays unloaded and the next activation retries.
    pub fn load(&mut self, handle: &OutputStreamHandle) -> Result<(), MixerError> {
        if self.loaded {
            return Ok(());
        }

        let data = match &self.audio_data {
            Some(data) => Arc::clone(data),
            None => {
                let bytes = std::fs::read(&self.path).map_err(|e| MixerError::LoadFailed {
                    path: self.path.display().to_string(),
                    source: Box::new(e),
                })?;
                let data = Arc::new(bytes);
                self.audio_data = Some(Arc::clone(&data));
                data
            }
        };

        // Note: rodio's Decoder requires owned data with 'static lifetime
        let cursor = Cursor::new((*data).clone());
        let source = Decoder::new_looped(cursor).map_err(|e| MixerError::DecodeFailed {
            path: self.path.display().to_string(),
            source: Box::new(e),
        })?;

        let sink = Sink::try_new(handle).map_err(|e| MixerError::PlaybackFailed(Box::new(e)))?;
        sink.set_volume(0.0);
        sink.append(source);
        sink.play();

        self.sink = Some(sink);
        self.loaded = true;
        tracing::info!(
            "Loaded channel {}: {} ({} bytes)",
            self.name,
            self.path.display(),
            data.len()
        );
        Ok(())
    }

    /// Schedule a smooth ramp to `target` over `duration`.
    ///
    /// Cancels any in-flight ramp first (last-writer-wins). Ignored until
    /// the channel is loaded, so a tick firing mid-load never operates on a
    /// half-initialized channel.
    pub fn set_gain(&mut self, target: f32, duration: Duration, now: Instant) {
        if !self.loaded {
            return;
        }
        self.envelope.ramp_to(target, duration, now);
        self.apply(now);
    }

    /// Set gain without a ramp; used for live slider input.
    pub fn set_immediate(&mut self, value: f32, now: Instant) {
        if !self.loaded {
            return;
        }
        self.envelope.set_immediate(value);
        self.apply(now);
    }

    /// Advance the envelope and push the current gain to the sink.
    pub fn tick(&mut self, now: Instant) {
        if self.loaded {
            self.apply(now);
        }
    }

    /// Current gain as of `now`.
    pub fn gain(&mut self, now: Instant) -> f32 {
        self.envelope.value(now)
    }

    /// The gain the channel is ramping toward.
    pub fn target_gain(&self) -> f32 {
        self.envelope.target()
    }

    fn apply(&mut self, now: Instant) {
        let gain = self.envelope.value(now);
        if let Some(sink) = &self.sink {
            sink.set_volume(gain);
        }
    }

    /// Build a channel that behaves as loaded without touching any audio
    /// device. The envelope logic runs fully; sink updates are skipped.
    #[cfg(test)]
    pub(crate) fn loaded_for_test(
        name: impl Into<String>,
        set_point: f32,
        curve: RampCurve,
    ) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            set_point: set_point.clamp(0.0, 1.0),
            envelope: GainEnvelope::new(curve),
            audio_data: None,
            sink: None,
            loaded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn test_unloaded_channel_ignores_gain_changes() {
        let mut channel = GainChannel::new(
            "rain",
            PathBuf::from("audio/rain.mp3"),
            0.4,
            RampCurve::Linear,
        );
        let now = Instant::now();

        channel.set_gain(1.0, secs(3.0), now);
        channel.set_immediate(0.8, now);

        assert!(!channel.is_loaded());
        assert!(!channel.is_audible());
        assert_eq!(channel.gain(now + secs(10.0)), 0.0);
    }

    #[test]
    fn test_loaded_channel_fades_to_set_point() {
        let mut channel = GainChannel::loaded_for_test("rain", 0.4, RampCurve::Linear);
        let now = Instant::now();

        channel.set_gain(channel.set_point(), secs(3.0), now);
        assert!(channel.is_audible());
        assert_eq!(channel.target_gain(), 0.4);

        let settled = channel.gain(now + secs(3.0));
        assert!((settled - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_fade_out_after_fade_in_settles_at_zero() {
        let mut channel = GainChannel::loaded_for_test("birds", 0.4, RampCurve::Linear);
        let now = Instant::now();

        channel.set_gain(0.4, secs(3.0), now);
        channel.set_gain(0.0, secs(3.0), now);

        assert!(!channel.is_audible());
        assert_eq!(channel.gain(now + secs(3.0)), 0.0);
    }

    #[test]
    fn test_set_point_is_clamped() {
        let mut channel = GainChannel::loaded_for_test("cafe", 0.4, RampCurve::Linear);
        channel.set_set_point(1.7);
        assert_eq!(channel.set_point(), 1.0);
        channel.set_set_point(-0.2);
        assert_eq!(channel.set_point(), 0.0);
    }

    #[test]
    fn test_set_immediate_overrides_ramp() {
        let mut channel = GainChannel::loaded_for_test("rain", 0.4, RampCurve::Linear);
        let now = Instant::now();

        channel.set_gain(1.0, secs(10.0), now);
        channel.set_immediate(0.25, now);

        assert_eq!(channel.target_gain(), 0.25);
        assert_eq!(channel.gain(now + secs(30.0)), 0.25);
    }
}
