//! Client for public links on the MEGA storage service.
//!
//! Provides verified downloads with:
//! - Anonymous session bootstrap (ephemeral account, `tsid` or RSA `csid`)
//! - JSON envelope transport with sequence ids and `-3` retries
//! - Parsing of both public link encodings
//! - Streamed AES-CTR decryption with chained CBC-MAC verification
//! - A batch driver that isolates per-file failures

pub mod api_client;
pub mod batch;
pub mod config;
pub mod downloader;
pub mod error;
pub mod link;
pub mod session;
pub mod types;

pub use api_client::MegaClient;
pub use batch::{download_all, BatchReport, DownloadOutcome, DownloadRequest};
pub use config::ClientConfig;
pub use error::{MegaError, MegaResult};
pub use link::PublicLink;
pub use session::{AnonymousIdentity, LoginOutcome};
pub use types::*;

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
