//! Application settings
//!
//! Settings are read from a JSON file (`trialdash.json` by default, or the
//! path in `TRIALDASH_CONFIG`). `TRIALDASH_API_URL` overrides the API base
//! URL. A missing file means defaults; a malformed one is logged and
//! ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "TRIALDASH_CONFIG";
pub const API_URL_ENV: &str = "TRIALDASH_API_URL";
pub const DEFAULT_CONFIG_FILE: &str = "trialdash.json";

/// How the enrollment column filters rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentFilterPolicy {
    /// Checklist of derived statuses
    #[default]
    StatusSet,
    /// Minimum enrollment percentage slider
    MinPercentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Base URL of the file API. `None` loads files locally.
    pub api_base_url: Option<String>,
    pub table: TableSettings,
    pub dashboard: DashboardSettings,
    pub theme: ThemeSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub row_height: f32,
    pub overscan: usize,
    pub enrollment_filter: EnrollmentFilterPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub columns: u32,
    pub row_height: f32,
    /// Where the widget layout is persisted
    pub layout_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    pub dark_mode: bool,
    pub scale_factor: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            table: TableSettings::default(),
            dashboard: DashboardSettings::default(),
            theme: ThemeSettings::default(),
        }
    }
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            row_height: 56.0,
            overscan: 8,
            enrollment_filter: EnrollmentFilterPolicy::StatusSet,
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            columns: 12,
            row_height: 40.0,
            layout_path: PathBuf::from("dashboard-layout.json"),
        }
    }
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            scale_factor: 1.0,
        }
    }
}

impl AppSettings {
    /// Read settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Resolve settings from the environment: config file first, then the
    /// API URL override. Never fails; problems fall back to defaults.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut settings = match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            settings.api_base_url = if url.trim().is_empty() { None } else { Some(url) };
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.table.row_height, 56.0);
        assert_eq!(settings.table.overscan, 8);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trialdash.json");
        std::fs::write(
            &path,
            r#"{"api_base_url": "http://localhost:8000", "table": {"enrollment_filter": "min_percentage"}}"#,
        )
        .unwrap();

        let settings = AppSettings::load(&path).unwrap();
        assert_eq!(settings.api_base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(settings.table.enrollment_filter, EnrollmentFilterPolicy::MinPercentage);
        assert_eq!(settings.table.overscan, 8);
        assert_eq!(settings.dashboard.columns, 12);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(AppSettings::load(&path).is_err());
    }
}
