//! Configuration loading and resolution
//!
//! The client needs exactly one external endpoint (the analysis service
//! base URL) plus a couple of capture knobs. Values resolve in priority
//! order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file (`~/.config/solace/config.toml`)
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the analysis service base URL
pub const ANALYSIS_URL_ENV: &str = "SOLACE_ANALYSIS_URL";

const DEFAULT_ANALYSIS_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_FRAME_INTERVAL_SECS: u64 = 10;

/// Client configuration
#[derive(Debug, Clone)]
pub struct SolaceConfig {
    /// Base URL of the sentiment/emotion analysis service
    pub analysis_base_url: String,
    /// Whether the user consented to webcam frame sampling
    pub camera_consent: bool,
    /// Seconds between webcam frame captures during a recording session
    pub frame_interval_secs: u64,
}

impl Default for SolaceConfig {
    fn default() -> Self {
        Self {
            analysis_base_url: DEFAULT_ANALYSIS_URL.to_string(),
            camera_consent: false,
            frame_interval_secs: DEFAULT_FRAME_INTERVAL_SECS,
        }
    }
}

/// On-disk shape of the config file; all keys optional
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    analysis_base_url: Option<String>,
    camera_consent: Option<bool>,
    frame_interval_secs: Option<u64>,
}

impl SolaceConfig {
    /// Resolve configuration from environment, config file, and defaults
    pub fn resolve() -> Result<Self> {
        let file = match config_file_path() {
            Some(path) if path.exists() => Self::parse_file(&path)?,
            _ => ConfigFile::default(),
        };
        Ok(Self::merge(std::env::var(ANALYSIS_URL_ENV).ok(), file))
    }

    /// Resolve from an explicit config file path (used by tests)
    pub fn resolve_from(env_url: Option<String>, path: &std::path::Path) -> Result<Self> {
        let file = if path.exists() {
            Self::parse_file(path)?
        } else {
            ConfigFile::default()
        };
        Ok(Self::merge(env_url, file))
    }

    fn parse_file(path: &std::path::Path) -> Result<ConfigFile> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))
    }

    fn merge(env_url: Option<String>, file: ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            analysis_base_url: env_url
                .or(file.analysis_base_url)
                .unwrap_or(defaults.analysis_base_url),
            camera_consent: file.camera_consent.unwrap_or(defaults.camera_consent),
            frame_interval_secs: file
                .frame_interval_secs
                .unwrap_or(defaults.frame_interval_secs),
        }
    }
}

/// Platform config file location: `<config_dir>/solace/config.toml`
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("solace").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_nothing_set() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");
        let config = SolaceConfig::resolve_from(None, &missing).unwrap();
        assert_eq!(config.analysis_base_url, DEFAULT_ANALYSIS_URL);
        assert!(!config.camera_consent);
        assert_eq!(config.frame_interval_secs, 10);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "analysis_base_url = \"http://analysis.example:9000\"").unwrap();
        writeln!(f, "camera_consent = true").unwrap();
        writeln!(f, "frame_interval_secs = 30").unwrap();

        let config = SolaceConfig::resolve_from(None, &path).unwrap();
        assert_eq!(config.analysis_base_url, "http://analysis.example:9000");
        assert!(config.camera_consent);
        assert_eq!(config.frame_interval_secs, 30);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "analysis_base_url = \"http://from-file:9000\"\n").unwrap();

        let config =
            SolaceConfig::resolve_from(Some("http://from-env:7000".to_string()), &path).unwrap();
        assert_eq!(config.analysis_base_url, "http://from-env:7000");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "analysis_base_url = [not toml").unwrap();
        assert!(SolaceConfig::resolve_from(None, &path).is_err());
    }
}
