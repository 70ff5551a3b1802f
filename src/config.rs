use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::controller::SessionConfig;
use crate::geometry::ZoneDimensions;
use crate::screen::NotchStyle;

/// Default trigger/panel zone sizes, in points
pub const DEFAULT_TRIGGER_WIDTH: f64 = 160.0;
pub const DEFAULT_TRIGGER_HEIGHT: f64 = 14.0;
pub const DEFAULT_PANEL_WIDTH: f64 = 400.0;
pub const DEFAULT_PANEL_HEIGHT: f64 = 450.0;

/// Default timings, in milliseconds
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_TRIGGER_DWELL_MS: u64 = 300;
pub const DEFAULT_TRIGGER_COOLDOWN_MS: u64 = 1000;
pub const DEFAULT_AUTO_CLOSE_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_sample_interval", rename = "sampleIntervalMs")]
    pub sample_interval_ms: u64,
    #[serde(default = "default_trigger_dwell", rename = "triggerDwellMs")]
    pub trigger_dwell_ms: u64,
    #[serde(default = "default_trigger_cooldown", rename = "triggerCooldownMs")]
    pub trigger_cooldown_ms: u64,
    #[serde(default = "default_auto_close_delay", rename = "autoCloseDelayMs")]
    pub auto_close_delay_ms: u64,
}

fn default_sample_interval() -> u64 {
    DEFAULT_SAMPLE_INTERVAL_MS
}
fn default_trigger_dwell() -> u64 {
    DEFAULT_TRIGGER_DWELL_MS
}
fn default_trigger_cooldown() -> u64 {
    DEFAULT_TRIGGER_COOLDOWN_MS
}
fn default_auto_close_delay() -> u64 {
    DEFAULT_AUTO_CLOSE_DELAY_MS
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            trigger_dwell_ms: DEFAULT_TRIGGER_DWELL_MS,
            trigger_cooldown_ms: DEFAULT_TRIGGER_COOLDOWN_MS,
            auto_close_delay_ms: DEFAULT_AUTO_CLOSE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    #[serde(default = "default_trigger_width", rename = "triggerWidth")]
    pub trigger_width: f64,
    #[serde(default = "default_trigger_height", rename = "triggerHeight")]
    pub trigger_height: f64,
    #[serde(default = "default_panel_width", rename = "panelWidth")]
    pub panel_width: f64,
    #[serde(default = "default_panel_height", rename = "panelHeight")]
    pub panel_height: f64,
}

fn default_trigger_width() -> f64 {
    DEFAULT_TRIGGER_WIDTH
}
fn default_trigger_height() -> f64 {
    DEFAULT_TRIGGER_HEIGHT
}
fn default_panel_width() -> f64 {
    DEFAULT_PANEL_WIDTH
}
fn default_panel_height() -> f64 {
    DEFAULT_PANEL_HEIGHT
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            trigger_width: DEFAULT_TRIGGER_WIDTH,
            trigger_height: DEFAULT_TRIGGER_HEIGHT,
            panel_width: DEFAULT_PANEL_WIDTH,
            panel_height: DEFAULT_PANEL_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub modifiers: Vec<String>,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_hotkey")]
    pub hotkey: HotkeyConfig,
    #[serde(default)]
    pub timings: TimingConfig,
    #[serde(default)]
    pub zones: ZoneConfig,
    /// "auto" | "notch" | "floating"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Hide completed tasks from the panel list
    #[serde(default, rename = "hideCompleted")]
    pub hide_completed: bool,
}

fn default_hotkey() -> HotkeyConfig {
    HotkeyConfig {
        modifiers: vec!["meta".to_string(), "shift".to_string()],
        key: "KeyT".to_string(), // Cmd+Shift+T
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hotkey: default_hotkey(),
            timings: TimingConfig::default(),
            zones: ZoneConfig::default(),
            style: None, // Auto via getter
            hide_completed: false,
        }
    }
}

impl Config {
    pub fn notch_style(&self) -> NotchStyle {
        match self.style.as_deref() {
            Some("notch") => NotchStyle::Notch,
            Some("floating") => NotchStyle::Floating,
            Some(other) => {
                warn!(style = other, "Unknown style value, using auto");
                NotchStyle::Auto
            }
            None => NotchStyle::Auto,
        }
    }

    pub fn zone_dimensions(&self) -> ZoneDimensions {
        ZoneDimensions {
            trigger_width: self.zones.trigger_width,
            trigger_height: self.zones.trigger_height,
            panel_width: self.zones.panel_width,
            panel_height: self.zones.panel_height,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sample_interval: Duration::from_millis(self.timings.sample_interval_ms),
            trigger_dwell: Duration::from_millis(self.timings.trigger_dwell_ms),
            trigger_cooldown: Duration::from_millis(self.timings.trigger_cooldown_ms),
            auto_close_delay: Duration::from_millis(self.timings.auto_close_delay_ms),
            zones: self.zone_dimensions(),
        }
    }
}

/// Config file path (~/.notch-tasks/config.json)
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".notch-tasks").join("config.json"))
        .unwrap_or_else(|| std::env::temp_dir().join("notch-tasks-config.json"))
}

#[instrument(name = "load_config")]
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

/// Missing or malformed config falls back to defaults with a warning; a bad
/// config file must never keep the app from starting.
pub fn load_config_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to read config, using defaults");
            Config::default()
        }
        Ok(contents) => match serde_json::from_str::<Config>(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to parse config, using defaults");
                Config::default()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_constants() {
        let config = Config::default();
        assert_eq!(config.hotkey.modifiers, vec!["meta", "shift"]);
        assert_eq!(config.hotkey.key, "KeyT");
        assert_eq!(config.timings.trigger_dwell_ms, 300);
        assert_eq!(config.zones.panel_width, 400.0);
        assert!(!config.hide_completed);
    }

    #[test]
    fn partial_json_fills_missing_fields_with_defaults() {
        let json = r#"{"timings": {"triggerDwellMs": 500}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.timings.trigger_dwell_ms, 500);
        assert_eq!(config.timings.trigger_cooldown_ms, 1000);
        assert_eq!(config.zones.trigger_width, 160.0);
        assert_eq!(config.hotkey.key, "KeyT");
    }

    #[test]
    fn style_string_resolves() {
        let mut config = Config::default();
        assert_eq!(config.notch_style(), NotchStyle::Auto);
        config.style = Some("floating".into());
        assert_eq!(config.notch_style(), NotchStyle::Floating);
        config.style = Some("bogus".into());
        assert_eq!(config.notch_style(), NotchStyle::Auto);
    }

    #[test]
    fn session_config_converts_units() {
        let config = Config::default();
        let session = config.session_config();
        assert_eq!(session.trigger_dwell, Duration::from_millis(300));
        assert_eq!(session.zones.panel_height, 450.0);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("notch-tasks-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = load_config_from(&path);
        assert_eq!(config.timings.trigger_dwell_ms, 300);
        std::fs::remove_file(&path).ok();
    }
}
