//! Public link parsing.
//!
//! Two encodings are accepted:
//! - `https://host/file/<handle><delim><key>` where `<delim>` is any
//!   non-word character (usually `#`)
//! - `https://host/#!<handle>!<key>`

use crate::error::{MegaError, MegaResult};
use megafetch_crypto::FileKey;

const PATH_MARKER: &str = "/file/";
const FRAGMENT_MARKER: &str = "#!";

/// A file handle and its key text, as found in a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicLink {
    pub handle: String,
    pub key_text: String,
}

impl PublicLink {
    pub fn parse(url: &str) -> MegaResult<Self> {
        let normalized = if url.contains(PATH_MARKER) {
            from_path_form(&url.replace(' ', ""))?
        } else if let Some((_, rest)) = url.split_once(FRAGMENT_MARKER) {
            rest.to_string()
        } else {
            return Err(MegaError::LinkFormatInvalid(format!("missing key in {url}")));
        };

        let (handle, key_text) = normalized
            .split_once('!')
            .filter(|(h, k)| !h.is_empty() && !k.is_empty())
            .ok_or_else(|| MegaError::LinkFormatInvalid(format!("missing key in {url}")))?;

        Ok(Self {
            handle: handle.to_string(),
            key_text: key_text.to_string(),
        })
    }

    /// Decodes the key text into the 8-word file key.
    pub fn file_key(&self) -> MegaResult<FileKey> {
        FileKey::parse(&self.key_text)
            .map_err(|e| MegaError::LinkFormatInvalid(format!("bad file key: {e}")))
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Rewrites `.../file/<handle><delim><key>` as `<handle>!<key>`.
fn from_path_form(url: &str) -> MegaResult<String> {
    let invalid = || MegaError::LinkFormatInvalid(format!("no handle after {PATH_MARKER} in {url}"));

    let (_, after) = url.split_once(PATH_MARKER).ok_or_else(invalid)?;
    let handle_len = after.find(|c: char| !is_word(c)).ok_or_else(invalid)?;
    if handle_len == 0 {
        return Err(invalid());
    }

    let (handle, rest) = after.split_at(handle_len);
    let mut rest = rest.chars();
    rest.next();
    Ok(format!("{handle}!{}", rest.as_str()))
}
