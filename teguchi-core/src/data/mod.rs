//! Upstream discovery, dataset fetching, local archive and export.

pub mod archive;
pub mod export;
pub mod fetch;
pub mod http;
pub mod listing;
pub mod provider;
pub mod sync;
pub mod throttle;

pub use archive::LocalArchive;
pub use export::{OutputEncoding, RecordExporter};
pub use fetch::{decode_dataset, FormPostProvider};
pub use http::{build_client, HttpSettings};
pub use listing::{parse_listing, ListingPageSource};
pub use provider::{
    DataRecord, DatasetProvider, DateSource, SilentProgress, StdoutProgress, SyncError,
    SyncProgress,
};
pub use sync::{sync_archive, DateOrder, SyncSummary};
pub use throttle::{FixedDelay, Throttle};
