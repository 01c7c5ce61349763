mod support;

use megafetch_client::session::{decrypt_session_id, verify_temporary_session};
use megafetch_client::{AnonymousIdentity, MegaError};
use megafetch_crypto::{
    a32_to_base64, a32_to_bytes, base64_url_encode, bytes_to_a32, encode_mpi, wrap_key, Key128,
};
use num_bigint::BigUint;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use support::{client, init_logging, Action};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MASTER: Key128 = [0x1111_1111, 0x2222_2222, 0x3333_3333, 0x4444_4444];
const PASSWORD: Key128 = [0x5555_5555, 0x6666_6666, 0x7777_7777, 0x8888_8888];
const CHALLENGE: Key128 = [0x99, 0xaa, 0xbb, 0xcc];

fn identity() -> AnonymousIdentity {
    AnonymousIdentity::new(MASTER, PASSWORD, CHALLENGE)
}

fn wrapped_master() -> String {
    a32_to_base64(&wrap_key(&MASTER, &PASSWORD).unwrap())
}

/// A temporary session id that authenticates under `master`.
fn valid_tsid(master: &Key128) -> String {
    let token: Vec<u8> = (0u8..16).map(|b| b.wrapping_mul(17)).collect();
    let mut raw = token.clone();
    raw.extend(a32_to_bytes(&wrap_key(&bytes_to_a32(&token), master).unwrap()));
    base64_url_encode(&raw)
}

/// `privk` and `csid` fields for an RSA key over `p`, `q` with exponent `d`.
fn rsa_fields(p: &BigUint, q: &BigUint, d: &BigUint, plaintext: &BigUint) -> (String, String) {
    let mut key_bytes = Vec::new();
    for part in [p, q, d, &BigUint::from(1u32)] {
        key_bytes.extend(encode_mpi(part).unwrap());
    }
    key_bytes.resize(key_bytes.len().div_ceil(16) * 16, 0);
    let privk = a32_to_base64(&wrap_key(&bytes_to_a32(&key_bytes), &MASTER).unwrap());

    let phi = (p - 1u32) * (q - 1u32);
    let e = d.modinv(&phi).unwrap();
    let ciphertext = plaintext.modpow(&e, &(p * q));
    (privk, base64_url_encode(&encode_mpi(&ciphertext).unwrap()))
}

async fn mount_handshake(server: &MockServer, session: Value) {
    Mock::given(method("POST"))
        .and(path("/cs"))
        .and(Action("up"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["ephemeral-user"])))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cs"))
        .and(Action("us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([session])))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn temporary_session_login() {
    init_logging();
    let server = MockServer::start().await;
    let tsid = valid_tsid(&MASTER);
    mount_handshake(&server, json!({ "k": wrapped_master(), "tsid": tsid })).await;

    let client = client(&server);
    client.login_with_identity(&identity()).await.unwrap();

    assert_eq!(client.session_id().await, Some(tsid));
    assert_eq!(client.master_key().await, Some(MASTER));
    assert!(client.is_logged_in().await);
}

#[tokio::test]
async fn later_requests_carry_the_session_id() {
    let server = MockServer::start().await;
    let tsid = valid_tsid(&MASTER);
    mount_handshake(&server, json!({ "k": wrapped_master(), "tsid": tsid })).await;
    Mock::given(method("POST"))
        .and(path("/cs"))
        .and(Action("g"))
        .and(query_param("sid", tsid.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.login_with_identity(&identity()).await.unwrap();
    client.request(&json!({ "a": "g", "p": "x" })).await.unwrap();
}

#[tokio::test]
async fn up_request_registers_wrapped_master() {
    let server = MockServer::start().await;
    mount_handshake(&server, json!({ "k": wrapped_master(), "tsid": valid_tsid(&MASTER) })).await;

    let client = client(&server);
    client.login_with_identity(&identity()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let up: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(up[0]["k"], wrapped_master());
    let us: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(us[0], json!({ "a": "us", "user": "ephemeral-user" }));
    assert!(requests.iter().all(|r| !r.url.query_pairs().any(|(k, _)| k == "sid")));
}

#[tokio::test]
async fn forged_tsid_is_rejected() {
    let server = MockServer::start().await;
    let forged = valid_tsid(&[9, 9, 9, 9]);
    mount_handshake(&server, json!({ "k": wrapped_master(), "tsid": forged })).await;

    let client = client(&server);
    let err = client.login_with_identity(&identity()).await.unwrap_err();
    assert!(matches!(err, MegaError::HandshakeRejected(_)), "{err}");
    assert_eq!(client.session_id().await, None);
}

#[tokio::test]
async fn rsa_session_login() {
    let server = MockServer::start().await;
    let (privk, csid) = rsa_fields(
        &BigUint::from(61u32),
        &BigUint::from(53u32),
        &BigUint::from(2753u32),
        &BigUint::from(0x0a0bu32),
    );
    mount_handshake(
        &server,
        json!({ "k": wrapped_master(), "csid": csid, "privk": privk }),
    )
    .await;

    let client = client(&server);
    client.login_with_identity(&identity()).await.unwrap();
    assert_eq!(client.session_id().await.as_deref(), Some("Cgs"));
}

#[test]
fn rsa_session_id_is_truncated_to_43_bytes() {
    // Mersenne primes 2^127 - 1 and 2^521 - 1, public exponent 65537.
    let one = BigUint::from(1u32);
    let p = (&one << 127u32) - 1u32;
    let q = (&one << 521u32) - 1u32;
    let phi = (&p - 1u32) * (&q - 1u32);
    let d = BigUint::from(65537u32).modinv(&phi).unwrap();

    let message: Vec<u8> = (1u8..=60).collect();
    let (privk, csid) = rsa_fields(&p, &q, &d, &BigUint::from_bytes_be(&message));

    assert_eq!(
        decrypt_session_id(&privk, &csid, &MASTER).unwrap(),
        base64_url_encode(&message[..43])
    );
}

#[test]
fn rsa_session_id_under_wrong_master_is_rejected() {
    let (privk, csid) = rsa_fields(
        &BigUint::from(61u32),
        &BigUint::from(53u32),
        &BigUint::from(2753u32),
        &BigUint::from(65u32),
    );
    assert_eq!(decrypt_session_id(&privk, &csid, &MASTER).unwrap(), "QQ");
    assert_ne!(
        decrypt_session_id(&privk, &csid, &[1, 2, 3, 4]).ok().as_deref(),
        Some("QQ")
    );
}

#[test]
fn temporary_session_verification() {
    let tsid = valid_tsid(&MASTER);
    assert_eq!(verify_temporary_session(&tsid, &MASTER).unwrap(), tsid);
    assert!(verify_temporary_session(&tsid, &PASSWORD).is_err());
}

#[tokio::test]
async fn failed_account_creation_is_a_handshake_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(-2)))
        .mount(&server)
        .await;

    let err = client(&server).login_anonymous().await.unwrap_err();
    assert!(matches!(err, MegaError::HandshakeRejected(_)), "{err}");
}

#[tokio::test]
async fn non_object_session_reply_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cs"))
        .and(Action("up"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["ephemeral-user"])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cs"))
        .and(Action("us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["not-an-object"])))
        .mount(&server)
        .await;

    let err = client(&server).login_anonymous().await.unwrap_err();
    assert!(matches!(err, MegaError::HandshakeRejected(_)), "{err}");
}

#[tokio::test]
async fn session_reply_without_session_id_is_rejected() {
    let server = MockServer::start().await;
    mount_handshake(&server, json!({ "k": wrapped_master() })).await;

    let client = client(&server);
    let err = client.login_with_identity(&identity()).await.unwrap_err();
    assert!(matches!(err, MegaError::HandshakeRejected(_)), "{err}");
    assert!(!client.is_logged_in().await);
}
