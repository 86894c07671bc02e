//! Record types, capability traits and structured error types.
//!
//! `DateSource` and `DatasetProvider` abstract over the upstream site so the
//! sync driver can be exercised against in-memory fakes. The archive and the
//! exporter sit on the local side and never talk to the network.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Canonical on-the-wire and on-disk form of a calendar date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date as `YYYY-MM-DD`.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One broker's row for a single publication date.
///
/// Every field is kept as opaque text: upstream emits placeholders such as
/// `"-"` where a figure is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataRecord {
    #[serde(deserialize_with = "text_or_null")]
    pub info_date: String,
    #[serde(deserialize_with = "text_or_null")]
    pub company: String,
    #[serde(deserialize_with = "text_or_null")]
    pub n225_sell: String,
    #[serde(deserialize_with = "text_or_null")]
    pub n225_buy: String,
    #[serde(deserialize_with = "text_or_null")]
    pub n225_net: String,
    #[serde(deserialize_with = "text_or_null")]
    pub topix_sell: String,
    #[serde(deserialize_with = "text_or_null")]
    pub topix_buy: String,
    #[serde(deserialize_with = "text_or_null")]
    pub topix_net: String,
    #[serde(deserialize_with = "text_or_null")]
    pub net_total: String,
}

impl DataRecord {
    /// The exported columns, in output order. `info_date` is not exported.
    pub fn export_fields(&self) -> [&str; 8] {
        [
            self.company.as_str(),
            self.n225_sell.as_str(),
            self.n225_buy.as_str(),
            self.n225_net.as_str(),
            self.topix_sell.as_str(),
            self.topix_buy.as_str(),
            self.topix_net.as_str(),
            self.net_total.as_str(),
        ]
    }
}

/// `null` decodes to an empty string; any other non-string value is rejected.
fn text_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured error types for a sync run.
///
/// Every variant is fatal to the run; the driver stops at the first one.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("archive error at {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    #[error("refusing to overwrite archived file {}", .path.display())]
    AlreadyArchived { path: PathBuf },

    #[error("cannot encode {text:?} as {encoding}")]
    Unencodable { text: String, encoding: &'static str },

    #[error("export error: {0}")]
    ExportError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl SyncError {
    pub(crate) fn archive(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        SyncError::Archive {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Upstream listing of publication dates.
pub trait DateSource {
    /// Every date currently offered upstream, in the order upstream lists them.
    fn list_available_dates(&self) -> Result<Vec<NaiveDate>, SyncError>;
}

/// Upstream per-date dataset endpoint.
pub trait DatasetProvider {
    /// Fetch the full dataset for one date. Record order is upstream order.
    fn fetch(&self, date: NaiveDate) -> Result<Vec<DataRecord>, SyncError>;
}

/// Progress callback for a sync run.
pub trait SyncProgress {
    /// Called once discovery has returned.
    fn on_discovered(&self, total: usize);

    /// Called for a date whose archive file already exists.
    fn on_skipped(&self, file_name: &str);

    /// Called after a dataset has been written.
    fn on_saved(&self, file_name: &str, rows: usize);

    /// Called when every date has been handled.
    fn on_finished(&self, fetched: usize, skipped: usize);
}

/// Prints progress lines to stdout.
pub struct StdoutProgress;

impl SyncProgress for StdoutProgress {
    fn on_discovered(&self, total: usize) {
        println!("{total} date(s) listed upstream");
    }

    fn on_skipped(&self, file_name: &str) {
        println!("{file_name} already exists. skip it.");
    }

    fn on_saved(&self, file_name: &str, _rows: usize) {
        println!("{file_name} saved.");
    }

    fn on_finished(&self, fetched: usize, skipped: usize) {
        println!("\nSync complete: {fetched} saved, {skipped} skipped");
    }
}

/// Discards all progress events.
pub struct SilentProgress;

impl SyncProgress for SilentProgress {
    fn on_discovered(&self, _total: usize) {}
    fn on_skipped(&self, _file_name: &str) {}
    fn on_saved(&self, _file_name: &str, _rows: usize) {}
    fn on_finished(&self, _fetched: usize, _skipped: usize) {}
}
