//! JSON transport for the storage API.
//!
//! Every call is a POST to `{base}/cs?id=<seq>[&sid=<session>]` whose body
//! is a one-element array holding the request object. The reply is either
//! a bare status code or a one-element array holding the response.

use crate::config::ClientConfig;
use crate::error::{MegaError, MegaResult};
use crate::types::CODE_RETRY;
use megafetch_crypto::Key128;
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Session state established by the login handshake.
#[derive(Default)]
struct SessionState {
    session_id: Option<String>,
    master_key: Option<Key128>,
}

/// HTTP client for the storage API.
///
/// Safe to share between concurrent downloads: sequence ids come from an
/// atomic counter and the session is behind a lock. Per-download cipher
/// and MAC state never lives here.
pub struct MegaClient {
    pub(crate) http: Client,
    pub(crate) config: ClientConfig,
    sequence: AtomicU64,
    state: RwLock<SessionState>,
}

impl MegaClient {
    /// Creates a client whose request ids start at a random 32-bit value.
    pub fn new(config: ClientConfig) -> MegaResult<Self> {
        Self::with_sequence(config, u64::from(rand::random::<u32>()))
    }

    /// Creates a client with an explicit first request id.
    pub fn with_sequence(config: ClientConfig, first_id: u64) -> MegaResult<Self> {
        if config.request_timeout_secs == 0 {
            return Err(MegaError::Config("request_timeout_secs must be positive".to_string()));
        }
        let http = Client::builder()
            .build()
            .map_err(|e| MegaError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            sequence: AtomicU64::new(first_id),
            state: RwLock::new(SessionState::default()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn session_id(&self) -> Option<String> {
        self.state.read().await.session_id.clone()
    }

    pub async fn master_key(&self) -> Option<Key128> {
        self.state.read().await.master_key
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.session_id.is_some()
    }

    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        state.session_id = None;
        state.master_key = None;
    }

    pub(crate) async fn set_master_key(&self, master_key: Key128) {
        self.state.write().await.master_key = Some(master_key);
    }

    pub(crate) async fn set_session_id(&self, session_id: String) {
        self.state.write().await.session_id = Some(session_id);
    }

    /// Allocates the next request id.
    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends one request without retrying.
    pub async fn send(&self, request: &Value) -> MegaResult<Value> {
        let id = self.next_sequence();
        let mut query = vec![("id", id.to_string())];
        if let Some(sid) = self.session_id().await {
            query.push(("sid", sid));
        }

        let action = request.get("a").and_then(Value::as_str).unwrap_or("?");
        debug!("api request id={id} a={action}");

        let body = self
            .http
            .post(self.config.endpoint())
            .query(&query)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .json(&[request])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        interpret_response(serde_json::from_str(&body)?)
    }

    /// Sends a request, resending on `-3` with a fresh id up to the configured limit.
    pub async fn request(&self, request: &Value) -> MegaResult<Value> {
        let mut retries = 0;
        loop {
            match self.send(request).await {
                Err(err) if err.is_retryable() && retries < self.config.max_transient_retries => {
                    retries += 1;
                    warn!(
                        "transient API error, retry {retries}/{}",
                        self.config.max_transient_retries
                    );
                    if self.config.retry_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    }
                }
                other => return other,
            }
        }
    }
}

/// Unwraps the response envelope.
///
/// `0` comes back as-is (success, no payload), `-3` is
/// [`MegaError::TransientApi`], any other code is [`MegaError::FatalApi`].
/// Otherwise the single array element is returned.
pub fn interpret_response(body: Value) -> MegaResult<Value> {
    let element = match body {
        Value::Array(mut items) => {
            if items.len() != 1 {
                return Err(MegaError::UnexpectedResponse(format!(
                    "expected one response element, got {}",
                    items.len()
                )));
            }
            items.remove(0)
        }
        Value::Number(code) => Value::Number(code),
        other => {
            return Err(MegaError::UnexpectedResponse(format!(
                "response is neither a code nor an array: {other}"
            )));
        }
    };

    if element.is_number() {
        let code = element
            .as_i64()
            .ok_or_else(|| MegaError::UnexpectedResponse(format!("non-integer status {element}")))?;
        return match code {
            0 => Ok(element),
            CODE_RETRY => Err(MegaError::TransientApi { code }),
            _ => Err(MegaError::FatalApi { code }),
        };
    }
    Ok(element)
}
