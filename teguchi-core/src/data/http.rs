//! Shared blocking HTTP client and response handling for the upstream adapters.

use super::provider::SyncError;
use std::time::Duration;

/// Transport settings shared by the listing and dataset adapters.
#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    /// Request timeout; `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

/// Build the blocking client used for every upstream request in a run.
pub fn build_client(settings: &HttpSettings) -> Result<reqwest::blocking::Client, SyncError> {
    let mut builder = reqwest::blocking::Client::builder();
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(agent) = &settings.user_agent {
        builder = builder.user_agent(agent.clone());
    }
    builder
        .build()
        .map_err(|e| SyncError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))
}

/// Map a transport-level failure.
pub(crate) fn transport_error(url: &str, err: reqwest::Error) -> SyncError {
    SyncError::NetworkUnreachable(format!("{url}: {err}"))
}

/// Reject anything outside the 2xx range.
pub(crate) fn check_status(
    url: &str,
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, SyncError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(SyncError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        assert!(build_client(&HttpSettings::default()).is_ok());
    }

    #[test]
    fn builds_with_timeout_and_agent() {
        let settings = HttpSettings {
            timeout: Some(Duration::from_secs(5)),
            user_agent: Some("teguchi-test".into()),
        };
        assert!(build_client(&settings).is_ok());
    }
}
