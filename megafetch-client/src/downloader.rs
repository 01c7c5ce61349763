//! Chunked download with decryption and integrity verification.
//!
//! The ciphertext is streamed from the temporary URL returned by `g`,
//! decrypted chunk by chunk into a staging file and folded into the
//! chained MAC. Only a verified file is moved to its destination; a
//! failed one is deleted.

use crate::api_client::MegaClient;
use crate::error::{MegaError, MegaResult};
use crate::link::PublicLink;
use crate::types::{FileInfo, NodeRef};
use megafetch_crypto::{
    base64_url_decode, decrypt_attributes, ChunkMac, ChunkPlan, ContentCipher, FileKey,
};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

impl MegaClient {
    /// Downloads the file behind a public link into `dest_dir`.
    ///
    /// The file is named `filename`, or the name stored in its encrypted
    /// attributes when `None`. Returns the final path.
    pub async fn download(
        &self,
        link: &str,
        dest_dir: &Path,
        filename: Option<&str>,
    ) -> MegaResult<PathBuf> {
        let link = PublicLink::parse(link)?;
        let key = link.file_key()?;
        self.download_file(&NodeRef::Public(link.handle), &key, dest_dir, filename)
            .await
    }

    /// Downloads a node of the session's own tree given its handle and key.
    pub async fn download_node(
        &self,
        handle: &str,
        key_text: &str,
        dest_dir: &Path,
        filename: Option<&str>,
    ) -> MegaResult<PathBuf> {
        let key = FileKey::parse(key_text)?;
        self.download_file(&NodeRef::Private(handle.to_string()), &key, dest_dir, filename)
            .await
    }

    /// Fetches size, attributes and (if available) the content URL.
    pub async fn file_info(&self, node: &NodeRef) -> MegaResult<FileInfo> {
        let response = self.request(&node.download_request()).await?;
        if !response.is_object() {
            return Err(MegaError::UnexpectedResponse(format!(
                "download request for {} returned {response}",
                node.handle()
            )));
        }
        Ok(serde_json::from_value(response)?)
    }

    async fn download_file(
        &self,
        node: &NodeRef,
        key: &FileKey,
        dest_dir: &Path,
        filename: Option<&str>,
    ) -> MegaResult<PathBuf> {
        let info = self.file_info(node).await?;
        // The service sometimes withholds the URL; such files can come back later.
        let Some(url) = info.download_url.as_deref() else {
            return Err(MegaError::ContentUnavailable(node.handle().to_string()));
        };

        let (Some(size), Some(blob)) = (info.size, info.attributes.as_deref()) else {
            return Err(MegaError::UnexpectedResponse(format!(
                "download request for {} lacks size or attributes",
                node.handle()
            )));
        };

        let attributes = decrypt_attributes(&base64_url_decode(blob)?, &key.content_key())?;
        let name = filename.map_or(attributes.name, str::to_string);
        let destination = dest_dir.join(file_name_of(&name)?);

        let staging_dir = self.config.staging_dir.as_deref().unwrap_or(dest_dir);
        for dir in [dest_dir, staging_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| MegaError::write_failed(dir, e))?;
        }
        let staging = staging_dir.join(format!("megafetch_{}.part", Uuid::new_v4()));

        info!("downloading {} ({size} bytes) to {}", node.handle(), destination.display());
        let outcome = match self.stream_to_file(url, size, key, &staging).await {
            Ok(()) => move_into_place(&staging, &destination).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("could not remove {}: {cleanup}", staging.display());
                }
            }
            return Err(e);
        }

        Ok(destination)
    }

    async fn stream_to_file(
        &self,
        url: &str,
        size: u64,
        key: &FileKey,
        staging: &Path,
    ) -> MegaResult<()> {
        let mut file = File::create(staging)
            .await
            .map_err(|e| MegaError::write_failed(staging, e))?;

        let budget = Duration::from_secs(self.config.download_read_timeout_secs);
        let response = tokio::time::timeout(budget, self.http.get(url).send())
            .await
            .map_err(|_| MegaError::Timeout(format!("content request to {url}")))??
            .error_for_status()?;
        let mut body = ContentStream::new(response, budget);

        let mut cipher = ContentCipher::for_file(key);
        let mut mac = ChunkMac::for_file(key);
        for chunk in ChunkPlan::new(size) {
            let mut buf = body.read_exact(chunk.len as usize).await?;
            cipher.apply(&mut buf);
            file.write_all(&buf)
                .await
                .map_err(|e| MegaError::write_failed(staging, e))?;
            mac.update(&buf);
            info!("{} of {size} downloaded", chunk.end());
        }
        file.flush()
            .await
            .map_err(|e| MegaError::write_failed(staging, e))?;
        drop(file);

        if !mac.verify(&key.meta_mac()) {
            warn!("MAC mismatch for content from {url}");
            return Err(MegaError::IntegrityFailure);
        }
        debug!("MAC verified");
        Ok(())
    }
}

/// Reads exact-length pieces out of a streamed response body.
struct ContentStream {
    response: reqwest::Response,
    pending: Vec<u8>,
    budget: Duration,
}

impl ContentStream {
    fn new(response: reqwest::Response, budget: Duration) -> Self {
        Self {
            response,
            pending: Vec::new(),
            budget,
        }
    }

    /// Returns the next `len` bytes, waiting at most the read budget.
    async fn read_exact(&mut self, len: usize) -> MegaResult<Vec<u8>> {
        let budget = self.budget;
        tokio::time::timeout(budget, self.fill(len))
            .await
            .map_err(|_| MegaError::Timeout(format!("reading {len} content bytes took over {budget:?}")))??;

        let rest = self.pending.split_off(len);
        Ok(std::mem::replace(&mut self.pending, rest))
    }

    async fn fill(&mut self, len: usize) -> MegaResult<()> {
        while self.pending.len() < len {
            match self.response.chunk().await? {
                Some(bytes) => self.pending.extend_from_slice(&bytes),
                None => {
                    return Err(MegaError::UnexpectedResponse(format!(
                        "content stream ended {} bytes short",
                        len - self.pending.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The last path component of `name`, so attributes cannot escape `dest_dir`.
fn file_name_of(name: &str) -> MegaResult<OsString> {
    Path::new(name)
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| MegaError::UnexpectedResponse(format!("unusable file name {name:?}")))
}

async fn move_into_place(staging: &Path, destination: &Path) -> MegaResult<()> {
    match tokio::fs::rename(staging, destination).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            tokio::fs::copy(staging, destination)
                .await
                .map_err(|e| MegaError::write_failed(destination, e))?;
            tokio::fs::remove_file(staging).await?;
            Ok(())
        }
        Err(e) => Err(MegaError::write_failed(destination, e)),
    }
}
