//! Per-date dataset fetcher.
//!
//! The data endpoint takes a form POST (`file_name`, `search_key`) and answers
//! with a JSON array of records. One request per date, no retry.

use super::http::{check_status, transport_error};
use super::provider::{date_key, DataRecord, DatasetProvider, SyncError};
use chrono::NaiveDate;

/// Decode a dataset response body. Record order is preserved.
pub fn decode_dataset(body: &[u8]) -> Result<Vec<DataRecord>, SyncError> {
    serde_json::from_slice(body)
        .map_err(|e| SyncError::ResponseFormatChanged(format!("dataset is not a record array: {e}")))
}

/// Posts the date query form to the data endpoint.
pub struct FormPostProvider {
    client: reqwest::blocking::Client,
    url: String,
    document_name: String,
}

impl FormPostProvider {
    pub fn new(
        client: reqwest::blocking::Client,
        url: impl Into<String>,
        document_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            document_name: document_name.into(),
        }
    }

    /// Form fields sent for `date`.
    fn form(&self, date: NaiveDate) -> [(&'static str, String); 2] {
        [
            ("file_name", self.document_name.clone()),
            ("search_key", date_key(date)),
        ]
    }
}

impl DatasetProvider for FormPostProvider {
    fn fetch(&self, date: NaiveDate) -> Result<Vec<DataRecord>, SyncError> {
        tracing::debug!(url = %self.url, %date, "posting dataset query");
        let resp = self
            .client
            .post(&self.url)
            .form(&self.form(date))
            .send()
            .map_err(|e| transport_error(&self.url, e))?;
        let body = check_status(&self.url, resp)?
            .bytes()
            .map_err(|e| transport_error(&self.url, e))?;
        let records = decode_dataset(&body)?;
        tracing::debug!(%date, records = records.len(), "dataset decoded");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_in_upstream_order() {
        let body = r#"[
            {"info_date":"2021-05-04","company":"B","n225_sell":"1","n225_buy":"2","n225_net":"-1",
             "topix_sell":"3","topix_buy":"4","topix_net":"-1","net_total":"-2"},
            {"info_date":"2021-05-04","company":"A","n225_sell":"-","n225_buy":"-","n225_net":"-",
             "topix_sell":"5","topix_buy":"5","topix_net":"0","net_total":"0"}
        ]"#;
        let records = decode_dataset(body.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].company, "B");
        assert_eq!(records[1].company, "A");
        assert_eq!(records[1].n225_sell, "-");
    }

    #[test]
    fn empty_array_is_an_empty_dataset() {
        assert!(decode_dataset(b"[]").unwrap().is_empty());
    }

    #[test]
    fn non_array_is_rejected() {
        let err = decode_dataset(br#"{"error":"no data"}"#).unwrap_err();
        assert!(matches!(err, SyncError::ResponseFormatChanged(_)));
    }

    #[test]
    fn html_error_page_is_rejected() {
        assert!(decode_dataset(b"<html>500</html>").is_err());
    }

    #[test]
    fn form_carries_document_and_date() {
        let client = reqwest::blocking::Client::new();
        let provider = FormPostProvider::new(client, "http://example.test/", "daily.php");
        let form = provider.form(NaiveDate::from_ymd_opt(2021, 5, 4).unwrap());
        assert_eq!(form[0], ("file_name", "daily.php".to_string()));
        assert_eq!(form[1], ("search_key", "2021-05-04".to_string()));
    }
}
