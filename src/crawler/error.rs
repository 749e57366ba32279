use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reasons a page could not be turned into a set of links.
/// These are ordinary crawl outcomes: the page is recorded with no links.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("not an HTML page (content type: {0})")]
    NotHtml(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("could not extract links: {0}")]
    Markup(String),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Violations of the claim-then-record protocol. Seeing one of these means a
/// worker iteration is broken, so the pool treats it as a defect.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("{0} was recorded without being claimed")]
    NotClaimed(Url),

    #[error("{0} was already recorded")]
    AlreadyRecorded(Url),
}
