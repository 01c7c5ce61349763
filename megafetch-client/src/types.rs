//! Wire types for API requests and responses.

use serde::{Deserialize, Serialize};

/// Status code asking the client to resend the request.
pub const CODE_RETRY: i64 = -3;

/// Which handle field a `g` request carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeRef {
    /// Handle from a public link (`p`).
    Public(String),
    /// Handle of a node in the session's own tree (`n`).
    Private(String),
}

impl NodeRef {
    pub fn handle(&self) -> &str {
        match self {
            NodeRef::Public(h) | NodeRef::Private(h) => h,
        }
    }

    /// Builds the `g` (get download URL) request.
    pub fn download_request(&self) -> serde_json::Value {
        match self {
            NodeRef::Public(h) => serde_json::json!({ "a": "g", "g": 1, "p": h }),
            NodeRef::Private(h) => serde_json::json!({ "a": "g", "g": 1, "n": h }),
        }
    }
}

/// Response to a `g` request.
///
/// `g` is absent when the service cannot serve the file right now, and
/// the other fields may then be missing too.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "g", default)]
    pub download_url: Option<String>,
    #[serde(rename = "s", default)]
    pub size: Option<u64>,
    #[serde(rename = "at", default)]
    pub attributes: Option<String>,
}

/// Response to a `us` (start session) request.
///
/// Exactly one of `tsid` or (`csid`, `privk`) is expected.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Master key wrapped under the password key.
    pub k: Option<String>,
    #[serde(default)]
    pub tsid: Option<String>,
    #[serde(default)]
    pub csid: Option<String>,
    #[serde(default)]
    pub privk: Option<String>,
}
