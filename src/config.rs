use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mixer::RampCurve;

fn default_focus_secs() -> u32 {
    25 * 60
}

fn default_break_secs() -> u32 {
    5 * 60
}

fn default_set_point() -> f32 {
    0.4
}

fn default_music_volume() -> f32 {
    0.4
}

fn default_toggle_fade_secs() -> f32 {
    3.0
}

fn default_slider_ramp_secs() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

/// One ambient channel: a name and the audio asset behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub name: String,
    pub path: String,

    /// Volume the channel fades to when toggled on.
    #[serde(default = "default_set_point")]
    pub set_point: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Focus phase length in seconds
    #[serde(default = "default_focus_secs")]
    pub focus_secs: u32,

    /// Break phase length in seconds
    #[serde(default = "default_break_secs")]
    pub break_secs: u32,

    /// Ambient channels, keyed by name
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,

    /// Notification chime played on every phase transition
    pub chime_path: String,

    /// Music tracks for shuffled continuous playback
    #[serde(default)]
    pub music_tracks: Vec<String>,

    /// Whether the shuffled music playlist is available
    #[serde(default = "default_true")]
    pub shuffle_enabled: bool,

    /// Shape of volume ramps (linear or exponential)
    #[serde(default)]
    pub ramp_curve: RampCurve,

    /// Persistent music volume
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,

    /// Cross-fade length for channel toggles, in seconds
    #[serde(default = "default_toggle_fade_secs")]
    pub toggle_fade_secs: f32,

    /// Ramp length for live volume-slider changes, in seconds
    #[serde(default = "default_slider_ramp_secs")]
    pub slider_ramp_secs: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focus_secs: default_focus_secs(),
            break_secs: default_break_secs(),
            channels: vec![ChannelEntry {
                name: "jungle".to_string(),
                path: "audio/JUNGLEBREAK.mp3".to_string(),
                set_point: default_set_point(),
            }],
            chime_path: "audio/NewspaperPageTurn4.wav".to_string(),
            music_tracks: vec![
                "audio/JUNGLE1.mp3".to_string(),
                "audio/JUNGLE2.mp3".to_string(),
                "audio/JUNGLE3.mp3".to_string(),
            ],
            shuffle_enabled: true,
            ramp_curve: RampCurve::default(),
            music_volume: default_music_volume(),
            toggle_fade_secs: default_toggle_fade_secs(),
            slider_ramp_secs: default_slider_ramp_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the config directory next to the executable.
    /// Creates a default config file if none exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let config = Self::load_from(&config_path)?;
            tracing::info!("Loaded config from: {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            tracing::info!("Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    }

    /// Get the config file path (in the app's base directory)
    fn config_path() -> Result<PathBuf, ConfigError> {
        let exe_path = env::current_exe().map_err(|e| ConfigError::LoadFailed {
            path: "<executable path>".to_string(),
            source: Box::new(e),
        })?;
        let exe_dir = exe_path
            .parent()
            .ok_or_else(|| ConfigError::Invalid("Could not determine executable directory".into()))?;
        Ok(exe_dir.join("config").join("config.json"))
    }

    /// Resolve an asset path from the config relative to the config
    /// directory.
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        match Self::config_path() {
            Ok(config_path) => match config_path.parent() {
                Some(dir) => dir.join(relative),
                None => PathBuf::from(relative),
            },
            Err(_) => PathBuf::from(relative),
        }
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.focus_secs == 0 || self.break_secs == 0 {
            return Err(ConfigError::Invalid(format!(
                "phase durations must be positive (focus={}s, break={}s)",
                self.focus_secs, self.break_secs
            )));
        }

        for entry in &self.channels {
            if !(0.0..=1.0).contains(&entry.set_point) {
                return Err(ConfigError::Invalid(format!(
                    "set point for channel {} out of range: {} (must be 0.0-1.0)",
                    entry.name, entry.set_point
                )));
            }
        }

        let mut names: Vec<&str> = self.channels.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.channels.len() {
            return Err(ConfigError::Invalid(
                "channel names must be unique".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.music_volume) {
            return Err(ConfigError::Invalid(format!(
                "music volume out of range: {} (must be 0.0-1.0)",
                self.music_volume
            )));
        }

        if self.toggle_fade_secs <= 0.0 || self.slider_ramp_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fade durations must be positive (toggle={}s, slider={}s)",
                self.toggle_fade_secs, self.slider_ramp_secs
            )));
        }

        Ok(())
    }
}
