//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the API client and downloader.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://g.api.mega.co.nz"). Calls go to `{base}/cs`.
    pub api_base_url: String,

    /// Timeout for each API call (seconds).
    pub request_timeout_secs: u64,

    /// Budget for reading one scheduled chunk from the content stream (seconds).
    pub download_read_timeout_secs: u64,

    /// How many times a `-3` response is retried before giving up.
    pub max_transient_retries: u32,

    /// Pause between transient retries (milliseconds).
    pub retry_delay_ms: u64,

    /// Where partial downloads are staged. `None` stages next to the destination.
    pub staging_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://g.api.mega.co.nz".to_string(),
            request_timeout_secs: 160,
            download_read_timeout_secs: 120,
            max_transient_retries: 3,
            retry_delay_ms: 500,
            staging_dir: None,
        }
    }
}

impl ClientConfig {
    /// Config pointing at a local stub server, with no retry pause.
    pub fn test(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_secs: 5,
            download_read_timeout_secs: 5,
            max_transient_retries: 2,
            retry_delay_ms: 0,
            staging_dir: None,
        }
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("{}/cs", self.api_base_url.trim_end_matches('/'))
    }
}
