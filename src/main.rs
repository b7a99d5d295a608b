use std::io::BufRead;
use std::thread;

use anyhow::Context;
use crossbeam_channel::{unbounded, Sender};
use tracing_subscriber::EnvFilter;

use focusmix::{
    AppResult, AudioMixer, Command, Config, ConsoleDisplay, Orchestrator, PhaseTimer,
};

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("===========================================");
    println!("  Focusmix - focus timer + ambient mixer");
    println!("===========================================\n");

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    println!("✓ Configuration loaded");
    println!("  Focus: {}s, Break: {}s", config.focus_secs, config.break_secs);
    println!(
        "  Channels: {}",
        config
            .channels
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if config.shuffle_enabled && !config.music_tracks.is_empty() {
        println!("  Music tracks: {}", config.music_tracks.len());
    }

    let timer = PhaseTimer::new(config.focus_secs, config.break_secs)
        .context("Invalid phase durations")?;
    let mixer = build_mixer(&config);

    let (sender, receiver) = unbounded();
    spawn_input_thread(sender);

    print_help();

    let mut orchestrator = Orchestrator::new(timer, mixer, ConsoleDisplay::new());
    orchestrator.run(receiver);

    println!("\nGoodbye!");
    Ok(())
}

/// Build the mixer from the asset manifest in the config.
fn build_mixer(config: &Config) -> AudioMixer {
    let mut mixer = AudioMixer::new(
        config.asset_path(&config.chime_path),
        config.ramp_curve,
        std::time::Duration::from_secs_f32(config.toggle_fade_secs),
        std::time::Duration::from_secs_f32(config.slider_ramp_secs),
    );
    for entry in &config.channels {
        mixer.register_channel(
            entry.name.clone(),
            config.asset_path(&entry.path),
            entry.set_point,
        );
    }
    if config.shuffle_enabled && !config.music_tracks.is_empty() {
        let tracks = config
            .music_tracks
            .iter()
            .map(|t| config.asset_path(t))
            .collect();
        mixer.set_playlist(tracks, config.music_volume);
    }
    mixer
}

/// Read commands from stdin and forward them to the orchestrator.
fn spawn_input_thread(sender: Sender<Command>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    let quitting = command == Command::Quit;
                    if sender.send(command).is_err() || quitting {
                        break;
                    }
                }
                None => {
                    if !line.trim().is_empty() {
                        println!("Unknown command: {}", line.trim());
                        print_help();
                    }
                }
            }
        }
        // EOF on stdin also shuts the loop down.
        let _ = sender.send(Command::Quit);
    });
}

fn print_help() {
    println!("\nCommands:");
    println!("  start | pause | stop | reset");
    println!("  on <channel> / off <channel>");
    println!("  vol <channel> <0.0-1.0>");
    println!("  music on|off");
    println!("  musicvol <0.0-1.0>");
    println!("  preset <focus-min> <break-min>");
    println!("  quit\n");
}

/// Parse one line of user input into a command.
fn parse_command(line: &str) -> Option<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["start"] => Some(Command::Start),
        ["pause"] => Some(Command::Pause),
        ["stop"] => Some(Command::Stop),
        ["reset"] => Some(Command::Reset),
        ["quit"] | ["exit"] => Some(Command::Quit),
        ["on", name] => Some(Command::Toggle {
            name: name.to_string(),
            on: true,
        }),
        ["off", name] => Some(Command::Toggle {
            name: name.to_string(),
            on: false,
        }),
        ["vol", name, value] => value.parse().ok().map(|value| Command::SetVolume {
            name: name.to_string(),
            value,
        }),
        ["music", "on"] => Some(Command::Music { on: true }),
        ["music", "off"] => Some(Command::Music { on: false }),
        ["musicvol", value] => value
            .parse()
            .ok()
            .map(|value| Command::SetMusicVolume { value }),
        ["preset", focus_min, break_min] => {
            let focus: u32 = focus_min.parse().ok()?;
            let brk: u32 = break_min.parse().ok()?;
            Some(Command::SetDurations {
                focus_secs: focus * 60,
                break_secs: brk * 60,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("start"), Some(Command::Start));
        assert_eq!(parse_command("  pause "), Some(Command::Pause));
        assert_eq!(parse_command("stop"), Some(Command::Stop));
        assert_eq!(parse_command("reset"), Some(Command::Reset));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("exit"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_channel_commands() {
        assert_eq!(
            parse_command("on rain"),
            Some(Command::Toggle {
                name: "rain".to_string(),
                on: true
            })
        );
        assert_eq!(
            parse_command("off rain"),
            Some(Command::Toggle {
                name: "rain".to_string(),
                on: false
            })
        );
        assert_eq!(
            parse_command("vol rain 0.7"),
            Some(Command::SetVolume {
                name: "rain".to_string(),
                value: 0.7
            })
        );
    }

    #[test]
    fn test_parse_preset_converts_minutes_to_seconds() {
        assert_eq!(
            parse_command("preset 25 5"),
            Some(Command::SetDurations {
                focus_secs: 1500,
                break_secs: 300
            })
        );
    }

    #[test]
    fn test_parse_music_commands() {
        assert_eq!(parse_command("music on"), Some(Command::Music { on: true }));
        assert_eq!(parse_command("music off"), Some(Command::Music { on: false }));
        assert_eq!(
            parse_command("musicvol 0.5"),
            Some(Command::SetMusicVolume { value: 0.5 })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("frobnicate"), None);
        assert_eq!(parse_command("vol rain loud"), None);
        assert_eq!(parse_command("preset a b"), None);
    }
}
