//! Date discovery from the upstream listing page.
//!
//! The page carries a `<select name="search_key">` whose options enumerate
//! every published date. Parsing is kept separate from the HTTP adapter so
//! the markup contract can be tested offline.

use super::http::{check_status, transport_error};
use super::provider::{DateSource, SyncError, DATE_FORMAT};
use chrono::NaiveDate;
use scraper::{Html, Selector};

/// CSS selector for the date picker on the listing page.
pub const DATE_OPTION_SELECTOR: &str = "select[name='search_key'] option";
const DATE_SELECT_SELECTOR: &str = "select[name='search_key']";

/// Extract the option dates from a listing page, in document order.
///
/// Options with an empty `value` are placeholders and are ignored. A page
/// without the control at all means the markup changed.
pub fn parse_listing(html: &str) -> Result<Vec<NaiveDate>, SyncError> {
    let document = Html::parse_document(html);
    let select = Selector::parse(DATE_SELECT_SELECTOR)
        .map_err(|e| SyncError::ResponseFormatChanged(format!("bad selector: {e}")))?;
    let option = Selector::parse(DATE_OPTION_SELECTOR)
        .map_err(|e| SyncError::ResponseFormatChanged(format!("bad selector: {e}")))?;

    if document.select(&select).next().is_none() {
        return Err(SyncError::ResponseFormatChanged(
            "listing page has no search_key date selector".into(),
        ));
    }

    let mut dates = Vec::new();
    for element in document.select(&option) {
        let value = element.value().attr("value").unwrap_or("").trim();
        if value.is_empty() {
            continue;
        }
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
            SyncError::ResponseFormatChanged(format!("option value {value:?} is not a date: {e}"))
        })?;
        dates.push(date);
    }
    Ok(dates)
}

/// Reads the listing page over HTTP on every call.
pub struct ListingPageSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl ListingPageSource {
    pub fn new(client: reqwest::blocking::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl DateSource for ListingPageSource {
    fn list_available_dates(&self) -> Result<Vec<NaiveDate>, SyncError> {
        tracing::debug!(url = %self.url, "fetching listing page");
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| transport_error(&self.url, e))?;
        let body = check_status(&self.url, resp)?
            .text()
            .map_err(|e| transport_error(&self.url, e))?;
        let dates = parse_listing(&body)?;
        tracing::debug!(count = dates.len(), "listing page parsed");
        Ok(dates)
    }
}
