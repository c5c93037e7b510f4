//! Client configuration.
//!
//! Stored as TOML, by default at `~/.config/docdrop/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, ensure};
use docdrop_mock_server::MockConfig;
use docdrop_protocol::{ALLOWED_MIME_TYPES, DEFAULT_STORAGE_BASE_URL, MAX_FILE_SIZE, MAX_FILES};
use docdrop_transfer::{IncrementRange, IntakeLimits};
use docdrop_uploader::{DEFAULT_POOL_SIZE, DEFAULT_STEP_INTERVAL, UploadSettings};
use serde::{Deserialize, Serialize};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the upload/submit API.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Base of the location reference sent for each file on submit.
    #[serde(default = "default_storage_base_url")]
    pub storage_base_url: String,

    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Per-file size limit in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,

    #[serde(default)]
    pub upload: UploadConfig,

    /// Settings of the mock backend started by `serve` or `--embedded`.
    #[serde(default)]
    pub mock: MockConfig,
}

/// `[upload]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Milliseconds between simulated progress steps.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,

    #[serde(default = "default_increment_min")]
    pub increment_min: f64,

    #[serde(default = "default_increment_max")]
    pub increment_max: f64,

    /// Call `/api/upload/complete` after each upload.
    #[serde(default)]
    pub confirm_uploads: bool,
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_storage_base_url() -> String {
    DEFAULT_STORAGE_BASE_URL.into()
}

fn default_max_files() -> usize {
    MAX_FILES
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

fn default_allowed_types() -> Vec<String> {
    ALLOWED_MIME_TYPES.iter().map(|t| t.to_string()).collect()
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

fn default_step_interval_ms() -> u64 {
    DEFAULT_STEP_INTERVAL.as_millis() as u64
}

fn default_increment_min() -> f64 {
    IncrementRange::default().min
}

fn default_increment_max() -> f64 {
    IncrementRange::default().max
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            step_interval_ms: default_step_interval_ms(),
            increment_min: default_increment_min(),
            increment_max: default_increment_max(),
            confirm_uploads: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            storage_base_url: default_storage_base_url(),
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
            upload: UploadConfig::default(),
            mock: MockConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration at `path` (or the default location), writing
    /// defaults there if the file does not exist yet.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            config
                .validate()
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            Ok(config)
        }
    }

    /// Rejects numeric settings the upload simulation and the mock backend
    /// cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let upload = &self.upload;
        for (name, value) in [
            ("upload.increment_min", upload.increment_min),
            ("upload.increment_max", upload.increment_max),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{name} must be a positive number, got {value}"
            );
        }
        ensure!(upload.pool_size > 0, "upload.pool_size must be at least 1");

        for (name, rate) in [
            ("mock.upload_failure_rate", self.mock.upload_failure_rate),
            ("mock.submit_failure_rate", self.mock.submit_failure_rate),
        ] {
            ensure!(
                (0.0..=1.0).contains(&rate),
                "{name} must be between 0 and 1, got {rate}"
            );
        }
        Ok(())
    }

    /// Writes the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn intake_limits(&self) -> IntakeLimits {
        IntakeLimits {
            max_files: self.max_files,
            max_file_size: self.max_file_size,
            allowed_types: self.allowed_types.clone(),
        }
    }

    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            pool_size: self.upload.pool_size,
            step_interval: Duration::from_millis(self.upload.step_interval_ms),
            increments: IncrementRange::new(self.upload.increment_min, self.upload.increment_max),
            confirm_uploads: self.upload.confirm_uploads,
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("docdrop").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("docdrop")
            .join("config.toml")
    }
}
