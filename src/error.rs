use reqwest::StatusCode;
use thiserror::Error;

use crate::models::ItemId;

/// Failure of a single call against the item source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with {status}")]
    Status { url: String, status: StatusCode },

    #[error("item {0} does not exist")]
    MissingItem(ItemId),

    #[error("item {0} timed out")]
    Timeout(ItemId),

    #[error("invalid source url: {0}")]
    Url(#[from] url::ParseError),
}

/// The only failure callers of the top stories service ever see.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("upstream unavailable: {0}")]
    Upstream(#[from] SourceError),
}
