//! Teguchi Core — incremental mirror of the daily per-broker futures position
//! tables.
//!
//! - Date discovery from the upstream listing page
//! - Local archive index (one file per date, existence = captured)
//! - Per-date dataset fetch behind a politeness throttle
//! - CSV export in UTF-8 or Shift-JIS

pub mod config;
pub mod data;

pub use config::SyncConfig;
pub use data::{sync_archive, SyncError, SyncSummary};
