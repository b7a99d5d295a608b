//! Shuffled continuous music playback.
//!
//! Track advancement is driven by the mixer tick rather than by a
//! completion-callback chain: every tick, a running playlist whose sink has
//! drained starts the next track. Toggling off clears the running flag, so
//! the chain stops deterministically once the fade-out completes.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;
use rodio::{Decoder, OutputStreamHandle, Sink};

use super::ramp::{GainEnvelope, RampCurve};
use crate::error::MixerError;

/// An ordered, shuffled queue over a fixed track list.
///
/// The full list is reshuffled (Fisher-Yates) whenever the cursor runs past
/// the end, so playback never terminates and every track appears exactly
/// once per pass.
#[derive(Debug, Clone)]
pub struct TrackQueue {
    tracks: Vec<PathBuf>,
    order: Vec<usize>,
    cursor: usize,
}

impl TrackQueue {
    pub fn new(tracks: Vec<PathBuf>) -> Self {
        Self {
            tracks,
            order: Vec::new(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Produce a fresh uniform permutation of the full track list and reset
    /// the cursor to the start.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.order = (0..self.tracks.len()).collect();
        self.order.shuffle(rng);
        self.cursor = 0;
    }

    /// Path of the next track, reshuffling first if the queue is exhausted.
    pub fn advance(&mut self, rng: &mut impl Rng) -> Option<PathBuf> {
        if self.tracks.is_empty() {
            return None;
        }
        if self.order.is_empty() || self.cursor >= self.order.len() {
            self.shuffle(rng);
        }
        let index = self.order[self.cursor];
        self.cursor += 1;
        Some(self.tracks[index].clone())
    }

    /// The current shuffled order, as indices into the track list.
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

/// Continuous shuffled music playback on a dedicated gain envelope.
///
/// At most one track is audibly active at a time; starting a new track
/// stops and releases the previous one's sink.
pub struct ShufflePlaylist {
    queue: TrackQueue,
    envelope: GainEnvelope,
    set_point: f32,
    fade: Duration,
    running: bool,
    sink: Option<Sink>,
    stop_deadline: Option<Instant>,
}

impl ShufflePlaylist {
    pub fn new(tracks: Vec<PathBuf>, set_point: f32, fade: Duration, curve: RampCurve) -> Self {
        Self {
            queue: TrackQueue::new(tracks),
            envelope: GainEnvelope::new(curve),
            set_point: set_point.clamp(0.0, 1.0),
            fade,
            running: false,
            sink: None,
            stop_deadline: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start shuffled playback with a fade-in on the music envelope.
    ///
    /// The first track starts on the next tick; this keeps the toggle path
    /// free of any audio-device work.
    pub fn toggle_on(&mut self, now: Instant) {
        if self.running {
            return;
        }
        if self.queue.is_empty() {
            tracing::debug!("No music tracks configured; ignoring music toggle");
            return;
        }
        self.stop_deadline = None;
        self.queue.shuffle(&mut rand::thread_rng());
        if self.sink.is_none() {
            self.envelope.set_immediate(0.0);
        }
        self.envelope.ramp_to(self.set_point, self.fade, now);
        self.running = true;
        tracing::info!("Music playback started ({} tracks)", self.queue.len());
    }

    /// Fade out and, once the fade completes, stop and release the playing
    /// track.
    pub fn toggle_off(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        self.running = false;
        self.envelope.ramp_to(0.0, self.fade, now);
        self.stop_deadline = Some(now + self.fade);
        tracing::info!("Music playback stopping");
    }

    /// Update the persistent music volume; re-ramps over `ramp` when
    /// playback is active.
    pub fn set_volume(&mut self, value: f32, ramp: Duration, now: Instant) {
        self.set_point = value.clamp(0.0, 1.0);
        if self.running {
            self.envelope.ramp_to(self.set_point, ramp, now);
        }
    }

    /// Current music gain as of `now`.
    pub fn gain(&mut self, now: Instant) -> f32 {
        self.envelope.value(now)
    }

    /// Advance the envelope, finalize a pending stop, and start the next
    /// track when the current one has drained.
    ///
    /// `handle` is absent until the shared output has been opened; the
    /// playlist simply waits for a later tick in that case.
    pub fn tick(&mut self, handle: Option<&OutputStreamHandle>, now: Instant) {
        let gain = self.envelope.value(now);
        if let Some(sink) = &self.sink {
            sink.set_volume(gain);
        }

        if let Some(deadline) = self.stop_deadline {
            if now >= deadline {
                if let Some(sink) = self.sink.take() {
                    sink.stop();
                }
                self.stop_deadline = None;
                tracing::debug!("Music playback stopped");
            }
        }

        if self.running && self.sink.as_ref().map_or(true, |s| s.empty()) {
            if let Some(handle) = handle {
                if let Err(e) = self.play_next(handle, now) {
                    // Skip unplayable tracks; the next tick tries the next one.
                    tracing::warn!("Failed to start next track: {e}");
                }
            }
        }
    }

    fn play_next(&mut self, handle: &OutputStreamHandle, now: Instant) -> Result<(), MixerError> {
        let Some(path) = self.queue.advance(&mut rand::thread_rng()) else {
            return Ok(());
        };

        if let Some(previous) = self.sink.take() {
            previous.stop();
        }

        let bytes = std::fs::read(&path).map_err(|e| MixerError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let source = Decoder::new(Cursor::new(bytes)).map_err(|e| MixerError::DecodeFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        let sink = Sink::try_new(handle).map_err(|e| MixerError::PlaybackFailed(Box::new(e)))?;
        sink.set_volume(self.envelope.value(now));
        sink.append(source);
        sink.play();
        self.sink = Some(sink);

        tracing::info!("Now playing: {}", path.display());
        Ok(())
    }
}
