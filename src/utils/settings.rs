// Runtime settings
// Loaded from finbridge.toml in the data folder with FINBRIDGE_* env overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::path_resolver::resolve_settings_file;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Base URL for the application/upload/inquiry endpoints
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Portal login page used for auth-gated redirects
    #[serde(default = "default_portal_login_url")]
    pub portal_login_url: String,
    /// Per-request timeout for document uploads, in seconds
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    /// Mirror log output to stdout (smoke runs enable this)
    #[serde(default)]
    pub log_to_stdout: bool,
}

fn default_api_base_url() -> String {
    "https://api.finbridge.in".to_string()
}

fn default_portal_login_url() -> String {
    "https://portal.finbridge.in/login".to_string()
}

fn default_upload_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            portal_login_url: default_portal_login_url(),
            upload_timeout_secs: default_upload_timeout_secs(),
            log_to_stdout: false,
        }
    }
}

impl Settings {
    /// Load settings from the resolved settings file plus environment
    /// overrides. Writes a default file on first run so operators have a
    /// template to edit.
    pub fn load() -> Result<Self> {
        let path = resolve_settings_file()?;
        if !path.exists() {
            Settings::default().write_to(&path)?;
        }
        Self::load_from(&path)
    }

    /// Load settings from an explicit file path plus FINBRIDGE_* overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(config::Environment::with_prefix("FINBRIDGE").try_parsing(true))
            .build()
            .context("Failed to read settings sources")?;

        cfg.try_deserialize::<Settings>()
            .context("Failed to parse settings")
    }

    /// Write these settings as TOML to the given path.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let body = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write settings file {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production_endpoints() {
        let s = Settings::default();
        assert_eq!(s.api_base_url, "https://api.finbridge.in");
        assert_eq!(s.portal_login_url, "https://portal.finbridge.in/login");
        assert_eq!(s.upload_timeout_secs, 30);
        assert!(!s.log_to_stdout);
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finbridge.toml");

        let original = Settings {
            api_base_url: "https://staging-api.finbridge.in".to_string(),
            portal_login_url: "https://staging-portal.finbridge.in/login".to_string(),
            upload_timeout_secs: 10,
            log_to_stdout: true,
        };
        original.write_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, original, "Settings should survive a file round-trip");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn partial_file_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finbridge.toml");
        std::fs::write(&path, "upload_timeout_secs = 5\n").unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.upload_timeout_secs, 5);
        assert_eq!(
            loaded.api_base_url,
            default_api_base_url(),
            "Unset keys should fall back to defaults"
        );
    }
}
