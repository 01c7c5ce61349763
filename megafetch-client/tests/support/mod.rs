//! Shared helpers: a stub API on wiremock and encrypted file fixtures.
#![allow(dead_code)]

use megafetch_client::{ClientConfig, MegaClient};
use megafetch_crypto::{
    base64_url_encode, encrypt_attributes, ChunkMac, ChunkPlan, ContentCipher, FileAttributes,
    FileKey,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const CONTENT_KEY: [u32; 4] = [0x9e37_79b9, 0x7f4a_7c15, 0xf39c_c060, 0x5ced_c834];
pub const NONCE: [u32; 2] = [0x0123_4567, 0x89ab_cdef];

/// Matches `/cs` calls whose single request object has `"a": <action>`.
pub struct Action(pub &'static str);

impl Match for Action {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body.get(0)?.get("a")?.as_str().map(|a| a == self.0))
            .unwrap_or(false)
    }
}

/// Matches `/cs` calls whose request object carries `field`.
pub struct HasField(pub &'static str);

impl Match for HasField {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body.get(0).map(|r| r.get(self.0).is_some()))
            .unwrap_or(false)
    }
}

/// Matches `g` calls naming `handle` as either a public or a private node.
pub struct HandleIs(pub &'static str);

impl Match for HandleIs {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| {
                let r = body.get(0)?;
                r.get("p").or_else(|| r.get("n"))?.as_str().map(|h| h == self.0)
            })
            .unwrap_or(false)
    }
}

pub fn client(server: &MockServer) -> MegaClient {
    MegaClient::new(ClientConfig::test(server.uri())).expect("client")
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("megafetch_client=debug"))
        .with_test_writer()
        .try_init();
}

/// Deterministic, non-repeating test content.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7919) % 256) as u8 ^ (i / 256) as u8).collect()
}

/// A file encrypted the way the service stores it.
pub struct EncryptedFile {
    pub key: FileKey,
    pub plaintext: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub attributes: String,
}

impl EncryptedFile {
    pub fn new(plaintext: Vec<u8>, name: &str) -> Self {
        let mut mac = ChunkMac::new(&CONTENT_KEY, &[NONCE[0], NONCE[1], 0, 0]);
        for chunk in ChunkPlan::new(plaintext.len() as u64) {
            mac.update(&plaintext[chunk.offset as usize..chunk.end() as usize]);
        }
        let key = FileKey::compose(CONTENT_KEY, NONCE, mac.condensed());

        let mut ciphertext = plaintext.clone();
        ContentCipher::for_file(&key).apply(&mut ciphertext);

        let blob = encrypt_attributes(&FileAttributes::new(name), &CONTENT_KEY).expect("attributes");
        Self {
            key,
            plaintext,
            ciphertext,
            attributes: base64_url_encode(&blob),
        }
    }

    pub fn link(&self, handle: &str) -> String {
        format!("https://mega.nz/file/{handle}#{}", self.key.to_base64())
    }

    /// Serves the `g` metadata response and the content at `/dl/<handle>`.
    pub async fn mount(&self, server: &MockServer, handle: &'static str) {
        Mock::given(method("POST"))
            .and(path("/cs"))
            .and(Action("g"))
            .and(HandleIs(handle))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "s": self.ciphertext.len(),
                "at": self.attributes,
                "g": format!("{}/dl/{handle}", server.uri()),
            }])))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/dl/{handle}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(self.ciphertext.clone()))
            .mount(server)
            .await;
    }
}
