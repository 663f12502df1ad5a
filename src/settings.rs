// src/settings.rs
//
// Persisted operator settings (Documents/TDS_Monitor/settings.json).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::buffer::MAX_POINTS;
use crate::device::PortConfig;
use crate::error::SettingsError;

pub const DEFAULT_THRESHOLD_PPM: f64 = 500.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port_name: String,
    pub baud_rate: u32,
    pub threshold_ppm: f64,
    pub max_points: usize,
    pub poll_interval_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port_name: "COM5".to_string(),
            baud_rate: 9600,
            threshold_ppm: DEFAULT_THRESHOLD_PPM,
            max_points: MAX_POINTS,
            poll_interval_ms: 100,
            read_timeout_ms: 100,
        }
    }
}

impl Settings {
    /// App folder: Documents/TDS_Monitor.
    /// Falls back to Desktop, then current directory.
    pub fn app_dir() -> PathBuf {
        let base = dirs::document_dir()
            .or_else(dirs::desktop_dir)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        base.join("TDS_Monitor")
    }

    pub fn default_path() -> PathBuf {
        Self::app_dir().join("settings.json")
    }

    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Like `load`, but any problem is logged and defaults are used.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("settings load from {}: {e}; using defaults", path.display());
            Self::default()
        })
    }

    /// Write-then-rename so a crash never leaves a half-written file.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;

        std::fs::write(&tmp, json.as_bytes())?;
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn port_config(&self) -> PortConfig {
        PortConfig {
            port_name: self.port_name.clone(),
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
