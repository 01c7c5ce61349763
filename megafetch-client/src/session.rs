//! Anonymous session bootstrap.
//!
//! The handshake creates a throwaway account and logs into it:
//! 1. `up` registers the master key (wrapped under a random password key)
//!    together with a self-challenge token.
//! 2. `us` starts a session and returns the wrapped master key plus either
//!    a temporary session id (`tsid`) or an RSA-encrypted one (`csid`).

use crate::api_client::MegaClient;
use crate::error::{MegaError, MegaResult};
use crate::types::SessionResponse;
use megafetch_crypto::{
    a32_to_base64, a32_to_bytes, base64_to_a32, base64_url_decode, base64_url_encode,
    bytes_to_a32, decode_mpi, random_key, unwrap_key, wrap_key, Key128, RsaPrivateKey,
};
use serde_json::{json, Value};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the session id taken from the decrypted `csid`.
const SESSION_ID_BYTES: usize = 43;

/// Length of the token and of its MAC inside a `tsid`.
const TSID_PART: usize = 16;

/// Keys for a single-use anonymous account.
///
/// Built fresh for every run and handed to the login explicitly.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AnonymousIdentity {
    master_key: Key128,
    password_key: Key128,
    challenge: Key128,
}

impl AnonymousIdentity {
    pub fn new(master_key: Key128, password_key: Key128, challenge: Key128) -> Self {
        Self {
            master_key,
            password_key,
            challenge,
        }
    }

    pub fn generate() -> Self {
        Self::new(random_key(), random_key(), random_key())
    }

    /// The `up` request registering this identity.
    fn create_account_request(&self) -> MegaResult<Value> {
        let wrapped_master = wrap_key(&self.master_key, &self.password_key)?;

        let mut token = a32_to_bytes(&self.challenge);
        token.extend(a32_to_bytes(&wrap_key(&self.challenge, &self.master_key)?));

        Ok(json!({
            "a": "up",
            "k": a32_to_base64(&wrapped_master),
            "ts": base64_url_encode(&token),
        }))
    }
}

/// The two shapes a session-start response can take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    TemporarySession { tsid: String },
    Rsa { privk: String, csid: String },
}

impl LoginOutcome {
    pub fn classify(response: &SessionResponse) -> MegaResult<Self> {
        match (&response.tsid, &response.csid, &response.privk) {
            (Some(tsid), _, _) => Ok(LoginOutcome::TemporarySession { tsid: tsid.clone() }),
            (None, Some(csid), Some(privk)) => Ok(LoginOutcome::Rsa {
                privk: privk.clone(),
                csid: csid.clone(),
            }),
            _ => Err(MegaError::HandshakeRejected("unrecognized login response".to_string())),
        }
    }

    /// Derives the session id, authenticating it against the master key.
    pub fn session_id(&self, master_key: &Key128) -> MegaResult<String> {
        match self {
            LoginOutcome::TemporarySession { tsid } => verify_temporary_session(tsid, master_key),
            LoginOutcome::Rsa { privk, csid } => decrypt_session_id(privk, csid, master_key),
        }
    }
}

/// Checks that the trailing 16 bytes of `tsid` are its first 16 bytes
/// wrapped under the master key. Returns `tsid` unchanged on success.
pub fn verify_temporary_session(tsid: &str, master_key: &Key128) -> MegaResult<String> {
    let raw = base64_url_decode(tsid).map_err(handshake("tsid"))?;
    if raw.len() < 2 * TSID_PART {
        return Err(MegaError::HandshakeRejected(format!(
            "tsid is {} bytes, expected at least {}",
            raw.len(),
            2 * TSID_PART
        )));
    }

    let token = bytes_to_a32(&raw[..TSID_PART]);
    let expected = a32_to_bytes(&wrap_key(&token, master_key).map_err(handshake("tsid"))?);
    if expected != raw[raw.len() - TSID_PART..] {
        return Err(MegaError::HandshakeRejected(
            "temporary session id failed verification".to_string(),
        ));
    }
    Ok(tsid.to_string())
}

/// Decrypts `csid` with the RSA key wrapped in `privk`.
///
/// The session id is the URL-safe base64 of the first 43 bytes of the
/// big-endian plaintext.
pub fn decrypt_session_id(privk: &str, csid: &str, master_key: &Key128) -> MegaResult<String> {
    let wrapped = base64_to_a32(privk).map_err(handshake("privk"))?;
    let key_bytes = a32_to_bytes(&unwrap_key(&wrapped, master_key).map_err(handshake("privk"))?);
    let rsa = RsaPrivateKey::from_mpi_bytes(&key_bytes).map_err(handshake("privk"))?;

    let csid_bytes = base64_url_decode(csid).map_err(handshake("csid"))?;
    let (ciphertext, _) = decode_mpi(&csid_bytes).map_err(handshake("csid"))?;
    let plaintext = rsa.decrypt_raw(&ciphertext).map_err(handshake("csid"))?.to_bytes_be();

    let end = plaintext.len().min(SESSION_ID_BYTES);
    Ok(base64_url_encode(&plaintext[..end]))
}

fn handshake<E: std::fmt::Display>(field: &'static str) -> impl FnOnce(E) -> MegaError {
    move |e| MegaError::HandshakeRejected(format!("bad {field}: {e}"))
}

/// API status codes during login mean the handshake cannot continue.
fn step_failed(step: &'static str) -> impl FnOnce(MegaError) -> MegaError {
    move |e| match e {
        MegaError::FatalApi { code } | MegaError::TransientApi { code } => {
            MegaError::HandshakeRejected(format!("{step} failed with code {code}"))
        }
        other => other,
    }
}

impl MegaClient {
    /// Creates a throwaway account with fresh random keys and logs into it.
    pub async fn login_anonymous(&self) -> MegaResult<()> {
        self.login_with_identity(&AnonymousIdentity::generate()).await
    }

    /// Runs the anonymous handshake for a caller-supplied identity.
    pub async fn login_with_identity(&self, identity: &AnonymousIdentity) -> MegaResult<()> {
        let user = self
            .request(&identity.create_account_request()?)
            .await
            .map_err(step_failed("account creation"))?;
        let user = match user {
            Value::String(handle) => handle,
            other => {
                return Err(MegaError::HandshakeRejected(format!(
                    "account creation returned {other}"
                )));
            }
        };
        debug!("created ephemeral user {user}");

        let response = self
            .request(&json!({ "a": "us", "user": user }))
            .await
            .map_err(step_failed("session start"))?;
        if !response.is_object() {
            return Err(MegaError::HandshakeRejected(format!(
                "session start returned {response}"
            )));
        }
        let response: SessionResponse = serde_json::from_value(response)?;

        let wrapped_master = response
            .k
            .as_deref()
            .ok_or_else(|| MegaError::HandshakeRejected("missing master key".to_string()))?;
        let wrapped_master = base64_to_a32(wrapped_master).map_err(handshake("k"))?;
        let master_key: Key128 = unwrap_key(&wrapped_master, &identity.password_key)
            .map_err(handshake("k"))?
            .as_slice()
            .try_into()
            .map_err(|_| MegaError::HandshakeRejected("master key is not 4 words".to_string()))?;
        self.set_master_key(master_key).await;

        let outcome = LoginOutcome::classify(&response)?;
        let session_id = outcome.session_id(&master_key)?;
        self.set_session_id(session_id).await;

        info!(
            "anonymous session established ({})",
            match outcome {
                LoginOutcome::TemporarySession { .. } => "temporary",
                LoginOutcome::Rsa { .. } => "rsa",
            }
        );
        Ok(())
    }
}
