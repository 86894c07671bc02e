//! Sync driver: discover → check archive → throttle → fetch → export.
//!
//! Runs sequentially and stops at the first error. Dates already in the
//! archive are skipped without a request and without a throttle pause.

use super::archive::LocalArchive;
use super::export::RecordExporter;
use super::provider::{DatasetProvider, DateSource, SyncError, SyncProgress};
use super::throttle::Throttle;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Order in which discovered dates are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// As listed on the upstream page.
    #[default]
    Upstream,
    /// Oldest first.
    Chronological,
}

impl DateOrder {
    pub fn apply(self, dates: &mut [NaiveDate]) {
        if self == DateOrder::Chronological {
            dates.sort();
        }
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub discovered: usize,
    pub fetched: Vec<NaiveDate>,
    pub skipped: Vec<NaiveDate>,
}

impl SyncSummary {
    /// Whether the run had nothing left to fetch.
    pub fn up_to_date(&self) -> bool {
        self.fetched.is_empty()
    }
}

/// Run one full sync cycle.
///
/// The archive directory must already exist (see [`LocalArchive::ensure_dir`]).
pub fn sync_archive(
    source: &dyn DateSource,
    provider: &dyn DatasetProvider,
    archive: &LocalArchive,
    exporter: &RecordExporter,
    throttle: &dyn Throttle,
    order: DateOrder,
    progress: &dyn SyncProgress,
) -> Result<SyncSummary, SyncError> {
    let mut dates = source.list_available_dates()?;
    order.apply(&mut dates);
    progress.on_discovered(dates.len());

    let mut summary = SyncSummary {
        discovered: dates.len(),
        ..SyncSummary::default()
    };

    for date in dates {
        let file_name = archive.file_name(date);

        if archive.contains(date)? {
            progress.on_skipped(&file_name);
            summary.skipped.push(date);
            continue;
        }

        throttle.wait();
        let dataset = provider.fetch(date)?;
        exporter.export(&dataset, &archive.path_for(date))?;
        progress.on_saved(&file_name, dataset.len());
        summary.fetched.push(date);
    }

    progress.on_finished(summary.fetched.len(), summary.skipped.len());
    Ok(summary)
}
