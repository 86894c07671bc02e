//! Run configuration.
//!
//! Read from `teguchi.toml` in the working directory when that file exists.
//! Every key is optional; an empty file yields the built-in defaults.

use crate::data::{
    DateOrder, FixedDelay, HttpSettings, LocalArchive, OutputEncoding, RecordExporter, SyncError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "teguchi.toml";

pub const DEFAULT_INDEX_URL: &str = "http://j2funds.info/invest/contents/futures/daily.php";
pub const DEFAULT_DATA_URL: &str =
    "http://j2funds.info/invest/func/futures/_get_futures_daily_data.php";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Listing page carrying the date selector.
    pub index_url: String,
    /// Form-POST endpoint returning one date's records.
    pub data_url: String,
    /// Value of the `file_name` form field.
    pub document_name: String,
    /// Archive directory, relative to the working directory unless absolute.
    pub data_dir: PathBuf,
    pub extension: String,
    pub throttle_ms: u64,
    /// `None` picks the platform default.
    pub encoding: Option<OutputEncoding>,
    pub date_order: DateOrder,
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub log_level: String,
    /// `text` or `json`.
    pub log_format: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
            document_name: "daily.php".to_string(),
            data_dir: PathBuf::from("data"),
            extension: "csv".to_string(),
            throttle_ms: 2000,
            encoding: None,
            date_order: DateOrder::Upstream,
            request_timeout_secs: None,
            user_agent: None,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl SyncConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::ConfigError(format!("read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, SyncError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SyncError::ConfigError(format!("parse config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// `{dir}/teguchi.toml` if present, otherwise the defaults.
    pub fn load_or_default(dir: &Path) -> Result<Self, SyncError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.index_url.trim().is_empty() {
            return Err(SyncError::ConfigError("index_url must not be empty".into()));
        }
        if self.data_url.trim().is_empty() {
            return Err(SyncError::ConfigError("data_url must not be empty".into()));
        }
        if self.document_name.trim().is_empty() {
            return Err(SyncError::ConfigError("document_name must not be empty".into()));
        }
        if self.extension.trim().is_empty() {
            return Err(SyncError::ConfigError("extension must not be empty".into()));
        }
        match self.log_format.trim().to_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(SyncError::ConfigError(format!(
                "log_format must be text or json, got '{other}'"
            ))),
        }
    }

    /// Explicit encoding, or the platform default.
    pub fn resolved_encoding(&self) -> OutputEncoding {
        self.encoding.unwrap_or_else(OutputEncoding::for_platform)
    }

    /// Archive rooted at `working_dir` (ignored when `data_dir` is absolute).
    pub fn archive(&self, working_dir: &Path) -> LocalArchive {
        LocalArchive::new(working_dir.join(&self.data_dir), self.extension.clone())
    }

    pub fn exporter(&self) -> RecordExporter {
        RecordExporter::new(self.resolved_encoding())
    }

    pub fn throttle(&self) -> FixedDelay {
        FixedDelay::new(Duration::from_millis(self.throttle_ms))
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: self.request_timeout_secs.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}
