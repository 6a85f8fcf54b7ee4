// =============================================================================
// Series Provider — seam between the watcher and any market-data vendor
// =============================================================================

use async_trait::async_trait;
use thiserror::Error;

use super::series::{Series, SeriesKey};

/// Errors raised while fetching a series from a vendor.
///
/// The cycle driver never propagates these: a failed fetch is logged and the
/// instrument is treated as having no data for the cycle.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider error {code}: {description}")]
    Api { code: String, description: String },

    #[error("malformed provider response: {0}")]
    Decode(String),
}

/// Fetch a bar series for `key` covering the trailing `range`
/// (e.g. `"5d"`) at the key's interval.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn fetch(&self, key: &SeriesKey, range: &str) -> Result<Series, ProviderError>;
}
