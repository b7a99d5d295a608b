//! Wiring between the phase timer, the mixer, and the display.
//!
//! The orchestrator owns the only event loop in the application: a 1-second
//! ticker drives the timer, a faster ticker advances gain ramps and the
//! playlist, and a command channel carries user input. Mixer failures during
//! timer side effects are logged and swallowed; nothing is allowed to abort
//! the tick loop.

use std::time::{Duration, Instant};

use crossbeam_channel::{select, tick, Receiver};

use crate::display::StatusDisplay;
use crate::mixer::AudioMixer;
use crate::timer::{Phase, PhaseTimer, TimerEvent};

/// How often gain ramps and the playlist advance.
const MIXER_TICK: Duration = Duration::from_millis(100);

/// User commands accepted by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    Stop,
    Reset,
    Toggle { name: String, on: bool },
    SetVolume { name: String, value: f32 },
    Music { on: bool },
    SetMusicVolume { value: f32 },
    SetDurations { focus_secs: u32, break_secs: u32 },
    Quit,
}

pub struct Orchestrator<D: StatusDisplay> {
    timer: PhaseTimer,
    mixer: AudioMixer,
    display: D,
}

impl<D: StatusDisplay> Orchestrator<D> {
    pub fn new(timer: PhaseTimer, mixer: AudioMixer, display: D) -> Self {
        Self {
            timer,
            mixer,
            display,
        }
    }

    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    pub fn mixer_mut(&mut self) -> &mut AudioMixer {
        &mut self.mixer
    }

    /// Run until a `Quit` command arrives or all senders disconnect.
    pub fn run(&mut self, commands: Receiver<Command>) {
        let timer_ticker = tick(Duration::from_secs(1));
        let mixer_ticker = tick(MIXER_TICK);

        self.display
            .render(self.timer.phase(), self.timer.remaining_secs());

        loop {
            select! {
                recv(timer_ticker) -> _ => self.tick_timer(),
                recv(mixer_ticker) -> _ => self.mixer.tick(Instant::now()),
                recv(commands) -> msg => match msg {
                    Ok(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
            }
        }

        tracing::info!("Orchestrator loop stopped");
    }

    /// Advance the timer by one second and react to whatever it produced.
    pub fn tick_timer(&mut self) {
        if let Some(event) = self.timer.tick() {
            self.on_timer_event(event);
        }
    }

    /// Apply one user command. Returns false when the loop should exit.
    pub fn handle_command(&mut self, command: Command) -> bool {
        let now = Instant::now();
        match command {
            Command::Start => {
                if let Some(event) = self.timer.start() {
                    self.on_timer_event(event);
                }
            }
            Command::Pause => {
                if let Some(event) = self.timer.pause() {
                    self.on_timer_event(event);
                }
            }
            Command::Stop => {
                if let Some(event) = self.timer.stop() {
                    self.on_timer_event(event);
                }
                self.mixer.fade_all_out(now);
                if let Err(e) = self.mixer.music_toggle(false, now) {
                    tracing::warn!("Failed to stop music: {e}");
                }
            }
            Command::Reset => {
                if let Some(event) = self.timer.reset() {
                    self.on_timer_event(event);
                }
                self.mixer.fade_all_out(now);
                if let Err(e) = self.mixer.music_toggle(false, now) {
                    tracing::warn!("Failed to stop music: {e}");
                }
            }
            Command::Toggle { name, on } => {
                if let Err(e) = self.mixer.toggle(&name, on, now) {
                    tracing::warn!("Failed to toggle channel {name}: {e}");
                }
            }
            Command::SetVolume { name, value } => {
                self.mixer.set_volume(&name, value, now);
            }
            Command::Music { on } => {
                if let Err(e) = self.mixer.music_toggle(on, now) {
                    tracing::warn!("Failed to toggle music: {e}");
                }
            }
            Command::SetMusicVolume { value } => {
                self.mixer.set_music_volume(value, now);
            }
            Command::SetDurations {
                focus_secs,
                break_secs,
            } => match self.timer.set_durations(focus_secs, break_secs) {
                Ok(event) => self.on_timer_event(event),
                Err(e) => tracing::warn!("Rejected durations: {e}"),
            },
            Command::Quit => return false,
        }
        true
    }

    fn on_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::PhaseChanged {
                phase,
                remaining_secs,
            } => {
                let now = Instant::now();
                // A blocked chime must not abort the tick loop.
                if let Err(e) = self.mixer.play_chime() {
                    tracing::warn!("Chime playback failed: {e}");
                }
                if phase == Phase::Break {
                    self.mixer.fade_all_out(now);
                }
                // Returning to Focus leaves ambience as the user last set
                // it; re-toggling is manual.
                self.display.phase_changed(phase);
                self.display.render(phase, remaining_secs);
            }
            TimerEvent::Started {
                phase,
                remaining_secs,
            }
            | TimerEvent::Tick {
                phase,
                remaining_secs,
            }
            | TimerEvent::Paused {
                phase,
                remaining_secs,
            }
            | TimerEvent::Stopped {
                phase,
                remaining_secs,
            } => {
                self.display.render(phase, remaining_secs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::{GainChannel, RampCurve};
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingDisplay {
        renders: Vec<(Phase, u32)>,
        transitions: Vec<Phase>,
    }

    impl StatusDisplay for RecordingDisplay {
        fn render(&mut self, phase: Phase, remaining_secs: u32) {
            self.renders.push((phase, remaining_secs));
        }

        fn phase_changed(&mut self, phase: Phase) {
            self.transitions.push(phase);
        }
    }

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    fn orchestrator(
        focus: u32,
        brk: u32,
        channels: &[&str],
    ) -> Orchestrator<RecordingDisplay> {
        let timer = PhaseTimer::new(focus, brk).unwrap();
        let mut mixer = AudioMixer::new(
            PathBuf::from("audio/chime.wav"),
            RampCurve::Linear,
            secs(3.0),
            secs(0.1),
        );
        for name in channels {
            mixer.insert_channel_for_test(GainChannel::loaded_for_test(
                *name,
                0.4,
                RampCurve::Linear,
            ));
        }
        Orchestrator::new(timer, mixer, RecordingDisplay::default())
    }

    #[test]
    fn test_focus_expiry_fades_ambience_and_notifies_display() {
        let mut orch = orchestrator(1500, 300, &["rain", "birds"]);
        let start = Instant::now();

        orch.handle_command(Command::Start);
        orch.mixer_mut().toggle("rain", true, start).unwrap();
        orch.mixer_mut().toggle("birds", true, start).unwrap();

        for _ in 0..1500 {
            orch.tick_timer();
        }

        assert_eq!(orch.timer().phase(), Phase::Break);
        assert_eq!(orch.timer().remaining_secs(), 300);
        assert_eq!(orch.display.transitions, vec![Phase::Break]);

        // Ambience heads to silence; set-points survive for manual re-toggle.
        assert_eq!(orch.mixer_mut().channel_target("rain"), Some(0.0));
        assert_eq!(orch.mixer_mut().channel_target("birds"), Some(0.0));
    }

    #[test]
    fn test_break_to_focus_does_not_restore_ambience() {
        let mut orch = orchestrator(5, 3, &["rain"]);
        let start = Instant::now();

        orch.handle_command(Command::Start);
        orch.mixer_mut().toggle("rain", true, start).unwrap();

        // Through focus into break, then through break back to focus.
        for _ in 0..8 {
            orch.tick_timer();
        }

        assert_eq!(orch.timer().phase(), Phase::Focus);
        assert_eq!(orch.display.transitions, vec![Phase::Break, Phase::Focus]);
        // Ambience stays silent until the user re-toggles it.
        assert_eq!(orch.mixer_mut().channel_target("rain"), Some(0.0));
    }

    #[test]
    fn test_double_start_command_keeps_single_tick_rate() {
        let mut orch = orchestrator(100, 20, &[]);

        orch.handle_command(Command::Start);
        orch.handle_command(Command::Start);
        for _ in 0..10 {
            orch.tick_timer();
        }

        assert_eq!(orch.timer().remaining_secs(), 90);
    }

    #[test]
    fn test_stop_command_fades_ambience_out() {
        let mut orch = orchestrator(100, 20, &["rain"]);
        let start = Instant::now();

        orch.handle_command(Command::Start);
        orch.mixer_mut().toggle("rain", true, start).unwrap();
        orch.handle_command(Command::Stop);

        assert!(!orch.timer().is_running());
        assert_eq!(orch.timer().remaining_secs(), 100);
        assert_eq!(orch.mixer_mut().channel_target("rain"), Some(0.0));
    }

    #[test]
    fn test_toggle_command_reaches_mixer() {
        let mut orch = orchestrator(100, 20, &["rain"]);

        orch.handle_command(Command::Toggle {
            name: "rain".to_string(),
            on: true,
        });
        assert!(orch.mixer_mut().is_audible("rain"));

        orch.handle_command(Command::SetVolume {
            name: "rain".to_string(),
            value: 0.9,
        });
        assert_eq!(orch.mixer_mut().channel_target("rain"), Some(0.9));
    }

    #[test]
    fn test_unknown_channel_command_is_harmless() {
        let mut orch = orchestrator(100, 20, &[]);
        assert!(orch.handle_command(Command::Toggle {
            name: "nope".to_string(),
            on: true,
        }));
    }

    #[test]
    fn test_set_durations_command_resets_timer() {
        let mut orch = orchestrator(100, 20, &[]);
        orch.handle_command(Command::Start);
        for _ in 0..5 {
            orch.tick_timer();
        }

        orch.handle_command(Command::SetDurations {
            focus_secs: 1500,
            break_secs: 300,
        });

        assert!(!orch.timer().is_running());
        assert_eq!(orch.timer().remaining_secs(), 1500);
        assert_eq!(orch.timer().phase(), Phase::Focus);
    }

    #[test]
    fn test_quit_command_ends_loop() {
        let mut orch = orchestrator(100, 20, &[]);
        assert!(!orch.handle_command(Command::Quit));
    }

    #[test]
    fn test_tick_renders_remaining_time() {
        let mut orch = orchestrator(100, 20, &[]);
        orch.handle_command(Command::Start);
        orch.tick_timer();

        assert_eq!(
            orch.display.renders.last(),
            Some(&(Phase::Focus, 99))
        );
    }
}
