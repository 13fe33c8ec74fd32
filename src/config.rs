use crate::error::Result;
use crate::report::ReportMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub theme: Theme,
    /// Report mode preselected in the report view and used by the CLI
    pub default_report_mode: ReportMode,
    /// Rows shown in the upload preview (random sample)
    pub preview_rows: usize,
    /// Rows scanned when inferring CSV column types
    pub infer_schema_length: usize,
    /// Absolute z-score above which a value is an outlier
    pub z_threshold: f64,
    /// Multiplier applied to the IQR to build the inlier fence
    pub iqr_factor: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            default_report_mode: ReportMode::Full,
            preview_rows: 5,
            infer_schema_length: 10_000,
            z_threshold: 3.0,
            iqr_factor: 1.5,
        }
    }
}

impl AppSettings {
    /// Checks values a hand-edited config file could get wrong.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.z_threshold.is_finite() && self.z_threshold > 0.0) {
            return Err(format!("z_threshold must be positive, got {}", self.z_threshold));
        }
        if !(self.iqr_factor.is_finite() && self.iqr_factor >= 0.0) {
            return Err(format!("iqr_factor must be non-negative, got {}", self.iqr_factor));
        }
        if self.infer_schema_length == 0 {
            return Err("infer_schema_length must be at least 1".to_owned());
        }
        Ok(())
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("quickeda")
        .join("config.json")
}

/// Loads settings, falling back to defaults when the file is missing,
/// unreadable or invalid.
pub fn load_settings() -> AppSettings {
    let path = get_config_path();
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(&path)
    {
        match serde_json::from_str::<AppSettings>(&content) {
            Ok(settings) => match settings.validate() {
                Ok(()) => return settings,
                Err(e) => tracing::warn!("Ignoring invalid settings in {}: {e}", path.display()),
            },
            Err(e) => tracing::warn!("Ignoring unreadable settings in {}: {e}", path.display()),
        }
    }
    AppSettings::default()
}

pub fn save_settings(settings: &AppSettings) -> Result<()> {
    let path = get_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, content)?;
    tracing::debug!("Settings saved to {}", path.display());
    Ok(())
}
