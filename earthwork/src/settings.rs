//! Calculation defaults and the process-wide settings snapshot.

use std::path::Path;
use std::sync::RwLock;

use log::info;
use once_cell::sync::Lazy;

use crate::error::Result;

/// User-tunable defaults for earthwork calculations.
///
/// Missing keys in a settings file fall back to the defaults below and
/// unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Stripping depth applied where no region supplies one.
    pub default_strip_depth_ft: f64,
    /// Free-haul allowance for mass-haul overhaul.
    pub free_haul_distance_ft: f64,
    /// Band thickness for slice volumes.
    pub default_slice_thickness_ft: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_strip_depth_ft: 0.0,
            free_haul_distance_ft: 500.0,
            default_slice_thickness_ft: 0.5,
        }
    }
}

impl Settings {
    pub fn strip_depth_default(&self) -> f64 {
        self.default_strip_depth_ft
    }

    /// Loads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    /// Saves these settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

static CURRENT: Lazy<RwLock<Settings>> = Lazy::new(|| RwLock::new(Settings::default()));

/// Snapshot of the process-wide settings.
pub fn current() -> Settings {
    match CURRENT.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Installs new process-wide settings. Calculations already running keep
/// the snapshot they started with.
pub fn replace(settings: Settings) {
    match CURRENT.write() {
        Ok(mut guard) => *guard = settings,
        Err(poisoned) => *poisoned.into_inner() = settings,
    }
}
