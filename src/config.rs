use crate::types::{DeviceType, Side};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Session inputs. Read once when a session starts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Requested headset. `None` autodetects.
    pub device: Option<DeviceType>,
    /// Route every headset except Magic Leap through the OpenXR module.
    pub use_openxr: bool,
    /// Meters the controller must travel before a press turns into a drag.
    pub drag_threshold_distance: f32,
    /// Degrees the controller must turn before a press turns into a drag.
    pub drag_threshold_rotation: f32,
    /// Milliseconds a press may be held before it turns into a drag.
    pub drag_threshold_time: u64,
    pub workspace_size: f32,
    pub workspace_distance: f32,
    pub workspace_height: f32,
    /// Milliseconds.
    pub max_update_interval: f64,
    /// Milliseconds.
    pub min_update_interval: f64,
    pub min_navigation_scale: f32,
    pub max_navigation_scale: f32,
    pub clip_near: f32,
    pub clip_far: f32,
    pub module_prefix: String,
    /// Where vendor modules live. Defaults to the host executable's directory.
    pub module_dir: Option<PathBuf>,
    pub hand_dominance: Side,
    pub eye_dominance: Side,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            use_openxr: false,
            drag_threshold_distance: 0.012,
            drag_threshold_rotation: 8.0,
            drag_threshold_time: 150,
            workspace_size: 0.450,
            workspace_distance: 0.550,
            workspace_height: -0.350,
            max_update_interval: 1000.0,
            min_update_interval: 1000.0 / 120.0,
            min_navigation_scale: 0.001,
            max_navigation_scale: 1000.0,
            clip_near: 0.01,
            clip_far: 10000.0,
            module_prefix: "BlenderXR".into(),
            module_dir: None,
            hand_dominance: Side::Right,
            eye_dominance: Side::Right,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads the config from `$PIEVR_CONFIG`, or `pievr/config.json` in the user's config
    /// directory. Any problem falls back to the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {path:?}, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!("Failed to read config {path:?}: {e}");
                return Self::default();
            }
        };

        match Self::from_json(&data) {
            Ok(config) => config,
            Err(e) => {
                warn!("Malformed config {path:?}, using defaults: {e}");
                Self::default()
            }
        }
    }

    fn path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("PIEVR_CONFIG") {
            return Some(path.into());
        }
        let dir = std::env::var("XDG_CONFIG_HOME")
            .or_else(|_| std::env::var("HOME").map(|h| h + "/.config"))
            .ok()?;
        Some(Path::new(&dir).join("pievr").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "device": "Vive", "drag_threshold_time": 300 }"#)
            .expect("valid config");
        assert_eq!(config.device, Some(DeviceType::Vive));
        assert_eq!(config.drag_threshold_time, 300);
        assert_eq!(config.drag_threshold_distance, 0.012);
        assert_eq!(config.max_navigation_scale, 1000.0);
        assert!(!config.use_openxr);
    }

    #[test]
    fn malformed_file_falls_back() {
        let path = std::env::temp_dir().join(format!("pievr-bad-config-{}", std::process::id()));
        std::fs::write(&path, "{ not json").expect("write temp config");
        let config = Config::load_from(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn missing_file_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/pievr/config.json"));
        assert_eq!(config, Config::default());
    }
}
