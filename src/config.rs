use crate::{Rect, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "fleet";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Cascade,
    Tile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_exe_path")]
    pub exe_path: PathBuf,
    /// Optional window-class filter; empty means "any class".
    #[serde(default)]
    pub class_name: String,
    /// Saved reference position/size used as the layout origin.
    #[serde(default)]
    pub base_rect: Option<Rect>,
    #[serde(default = "default_layout")]
    pub layout: LayoutMode,
    #[serde(default = "default_cascade_dx")]
    pub cascade_dx: i32,
    #[serde(default = "default_cascade_dy")]
    pub cascade_dy: i32,
    #[serde(default = "default_launch_delay_ms")]
    pub launch_delay_ms: u64,
}

fn default_exe_path() -> PathBuf {
    PathBuf::from(r"C:\Program Files\Tencent\Weixin\Weixin.exe")
}
fn default_layout() -> LayoutMode {
    LayoutMode::Cascade
}
fn default_cascade_dx() -> i32 {
    30
}
fn default_cascade_dy() -> i32 {
    30
}
fn default_launch_delay_ms() -> u64 {
    800
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exe_path: default_exe_path(),
            class_name: String::new(),
            base_rect: None,
            layout: default_layout(),
            cascade_dx: default_cascade_dx(),
            cascade_dy: default_cascade_dy(),
            launch_delay_ms: default_launch_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing or unparsable file yields defaults, never an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str(&content).map_err(anyhow::Error::from))
        {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Config file {:?} unreadable ({}), using defaults", path, e);
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Per-user config file location: `%APPDATA%\fleet\config.json`, falling back
/// to the home directory when APPDATA is unset.
pub fn default_path() -> PathBuf {
    let base = std::env::var("APPDATA")
        .or_else(|_| std::env::var("HOME"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(base).join(APP_NAME).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("nope.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = AppConfig::load(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn round_trip_without_base_rect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig {
            exe_path: PathBuf::from(r"C:\Apps\Chat\chat.exe"),
            class_name: "ChatMainWnd".to_string(),
            base_rect: None,
            layout: LayoutMode::Tile,
            cascade_dx: 24,
            cascade_dy: 48,
            launch_delay_ms: 1200,
        };
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path), config);
    }

    #[test]
    fn round_trip_with_base_rect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig {
            base_rect: Some(Rect::new(100, 120, 800, 600)),
            ..AppConfig::default()
        };
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path), config);
    }

    #[test]
    fn layout_mode_uses_lowercase_keys() {
        let json = serde_json::to_string(&AppConfig::default()).unwrap();
        assert!(json.contains("\"cascade\""));

        let parsed: AppConfig =
            serde_json::from_str(&json.replace("\"cascade\"", "\"tile\"")).unwrap();
        assert_eq!(parsed.layout, LayoutMode::Tile);
    }
}
