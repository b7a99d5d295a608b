//! Mixer facade.
//!
//! `AudioMixer` is the single, explicitly constructed owner of the shared
//! audio output, the ambient channel registry, the notification chime, and
//! the optional music playlist. Callers hold the mixer by reference; there
//! is no global audio state.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::channel::GainChannel;
use super::playlist::ShufflePlaylist;
use super::ramp::RampCurve;
use crate::error::MixerError;

/// Keeps the output stream alive alongside the handle sinks are built from.
struct AudioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

/// The notification chime. Unlike ambient channels it plays once per
/// trigger, restarting from the beginning when already mid-playback.
struct Chime {
    path: PathBuf,
    data: Option<Arc<Vec<u8>>>,
    sink: Option<Sink>,
}

impl Chime {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: None,
            sink: None,
        }
    }

    fn play(&mut self, handle: &OutputStreamHandle) -> Result<(), MixerError> {
        let data = match &self.data {
            Some(data) => Arc::clone(data),
            None => {
                let bytes = std::fs::read(&self.path).map_err(|e| MixerError::LoadFailed {
                    path: self.path.display().to_string(),
                    source: Box::new(e),
                })?;
                let data = Arc::new(bytes);
                self.data = Some(Arc::clone(&data));
                data
            }
        };

        let source =
            Decoder::new(Cursor::new((*data).clone())).map_err(|e| MixerError::DecodeFailed {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })?;

        // Restart from the beginning even if the previous chime is still
        // sounding.
        if let Some(previous) = self.sink.take() {
            previous.stop();
        }
        let sink = Sink::try_new(handle).map_err(|e| MixerError::PlaybackFailed(Box::new(e)))?;
        sink.append(source);
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }
}

/// Registry of ambient channels plus chime and playlist.
pub struct AudioMixer {
    output: Option<AudioOutput>,
    channels: HashMap<String, GainChannel>,
    chime: Chime,
    playlist: Option<ShufflePlaylist>,
    curve: RampCurve,
    toggle_fade: Duration,
    slider_ramp: Duration,
}

impl AudioMixer {
    pub fn new(
        chime_path: PathBuf,
        curve: RampCurve,
        toggle_fade: Duration,
        slider_ramp: Duration,
    ) -> Self {
        Self {
            output: None,
            channels: HashMap::new(),
            chime: Chime::new(chime_path),
            playlist: None,
            curve,
            toggle_fade,
            slider_ramp,
        }
    }

    /// Register an ambient channel in the unloaded state.
    pub fn register_channel(&mut self, name: impl Into<String>, path: PathBuf, set_point: f32) {
        let name = name.into();
        let channel = GainChannel::new(name.clone(), path, set_point, self.curve);
        if self.channels.insert(name.clone(), channel).is_some() {
            tracing::warn!("Channel {name} registered twice; keeping the newer one");
        }
    }

    /// Attach a shuffled music playlist.
    pub fn set_playlist(&mut self, tracks: Vec<PathBuf>, set_point: f32) {
        self.playlist = Some(ShufflePlaylist::new(
            tracks,
            set_point,
            self.toggle_fade,
            self.curve,
        ));
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Open the shared audio output on first use. Failure is surfaced to
    /// the caller; the next activation retries.
    fn ensure_output(&mut self) -> Result<(), MixerError> {
        if self.output.is_none() {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| MixerError::OutputUnavailable(Box::new(e)))?;
            self.output = Some(AudioOutput {
                _stream: stream,
                handle,
            });
            tracing::info!("Audio output stream opened");
        }
        Ok(())
    }

    /// Turn an ambient channel on (fade to its set-point) or off (fade to
    /// silence). Unknown names are a no-op.
    pub fn toggle(&mut self, name: &str, on: bool, now: Instant) -> Result<(), MixerError> {
        if !self.channels.contains_key(name) {
            tracing::debug!("Ignoring toggle for unknown channel: {name}");
            return Ok(());
        }

        if on {
            let loaded = self.channels.get(name).map(GainChannel::is_loaded) == Some(true);
            if !loaded {
                self.ensure_output()?;
                let Some(output) = &self.output else {
                    return Ok(());
                };
                if let Some(channel) = self.channels.get_mut(name) {
                    channel.load(&output.handle)?;
                }
            }
            let fade = self.toggle_fade;
            if let Some(channel) = self.channels.get_mut(name) {
                let target = channel.set_point();
                channel.set_gain(target, fade, now);
                tracing::debug!("Channel {name} fading in to {target}");
            }
        } else {
            let fade = self.toggle_fade;
            if let Some(channel) = self.channels.get_mut(name) {
                channel.set_gain(0.0, fade, now);
                tracing::debug!("Channel {name} fading out");
            }
        }
        Ok(())
    }

    /// Update a channel's persistent set-point. If the channel is currently
    /// audible, re-ramp to the new value over the short slider duration so
    /// slider input feels responsive without the long toggle cross-fade.
    pub fn set_volume(&mut self, name: &str, value: f32, now: Instant) {
        let ramp = self.slider_ramp;
        match self.channels.get_mut(name) {
            Some(channel) => {
                channel.set_set_point(value);
                if channel.is_audible() {
                    let target = channel.set_point();
                    channel.set_gain(target, ramp, now);
                }
            }
            None => tracing::debug!("Ignoring volume for unknown channel: {name}"),
        }
    }

    /// Fade every registered channel to silence. Set-points are preserved,
    /// so re-toggling restores the previous mix.
    pub fn fade_all_out(&mut self, now: Instant) {
        let fade = self.toggle_fade;
        for channel in self.channels.values_mut() {
            channel.set_gain(0.0, fade, now);
        }
        tracing::debug!("Fading all ambient channels out");
    }

    /// Fade every loaded channel to `volume`.
    pub fn fade_all_in(&mut self, volume: f32, now: Instant) {
        let fade = self.toggle_fade;
        let volume = volume.clamp(0.0, 1.0);
        for channel in self.channels.values_mut() {
            channel.set_gain(volume, fade, now);
        }
    }

    /// Play the notification chime from its start.
    pub fn play_chime(&mut self) -> Result<(), MixerError> {
        self.ensure_output()?;
        let Some(output) = &self.output else {
            return Ok(());
        };
        self.chime.play(&output.handle)
    }

    /// Toggle shuffled music playback. A no-op when no playlist was
    /// configured.
    pub fn music_toggle(&mut self, on: bool, now: Instant) -> Result<(), MixerError> {
        if self.playlist.is_none() {
            return Ok(());
        }
        if on {
            // The first track starts on the next tick, which needs the
            // output to exist.
            self.ensure_output()?;
        }
        if let Some(playlist) = &mut self.playlist {
            if on {
                playlist.toggle_on(now);
            } else {
                playlist.toggle_off(now);
            }
        }
        Ok(())
    }

    pub fn set_music_volume(&mut self, value: f32, now: Instant) {
        let ramp = self.slider_ramp;
        if let Some(playlist) = &mut self.playlist {
            playlist.set_volume(value, ramp, now);
        }
    }

    /// Advance all gain envelopes and the playlist. Never fails: playback
    /// problems are logged and the next tick carries on.
    pub fn tick(&mut self, now: Instant) {
        for channel in self.channels.values_mut() {
            channel.tick(now);
        }
        let handle = self.output.as_ref().map(|o| &o.handle);
        if let Some(playlist) = &mut self.playlist {
            playlist.tick(handle, now);
        }
    }

    /// Current gain of a channel, if registered.
    pub fn channel_gain(&mut self, name: &str, now: Instant) -> Option<f32> {
        self.channels.get_mut(name).map(|c| c.gain(now))
    }

    /// The gain a channel is ramping toward, if registered.
    pub fn channel_target(&self, name: &str) -> Option<f32> {
        self.channels.get(name).map(GainChannel::target_gain)
    }

    pub fn is_audible(&self, name: &str) -> bool {
        self.channels.get(name).map(GainChannel::is_audible) == Some(true)
    }

    #[cfg(test)]
    pub(crate) fn insert_channel_for_test(&mut self, channel: GainChannel) {
        self.channels.insert(channel.name().to_string(), channel);
    }
}
