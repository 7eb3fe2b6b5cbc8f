#![allow(dead_code)]

use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use httpmock::prelude::*;
use httpmock::Mock;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{json, Value};

pub const KID: &str = "abc";
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";
pub const JWKS_PATH: &str = "/oauth2/v1/keys";

pub struct KeyMaterial {
    pub encoding: EncodingKey,
    pub modulus: String,
    pub exponent: String,
}

fn generate_key_material() -> KeyMaterial {
    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    let public_key = private_key.to_public_key();

    let private_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("private pem");
    let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key");

    KeyMaterial {
        encoding,
        modulus: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
        exponent: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
    }
}

/// Signing key published by the mock provider.
pub fn provider_key() -> &'static KeyMaterial {
    static KEY: OnceLock<KeyMaterial> = OnceLock::new();
    KEY.get_or_init(generate_key_material)
}

/// A second key the provider never publishes.
pub fn rogue_key() -> &'static KeyMaterial {
    static KEY: OnceLock<KeyMaterial> = OnceLock::new();
    KEY.get_or_init(generate_key_material)
}

/// Signs `claims` with a header of exactly `{"alg":"RS256","kid":kid}`.
pub fn sign(key: &KeyMaterial, kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.typ = None;
    header.kid = Some(kid.to_string());
    encode(&header, claims, &key.encoding).expect("sign token")
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn access_claims(issuer: &str) -> Value {
    let now = now();
    json!({
        "iss": issuer,
        "aud": "myclient",
        "cid": "myclient",
        "sub": "00u1abcd",
        "exp": now + 3_600,
        "iat": now - 10,
    })
}

pub struct MockProvider {
    pub server: MockServer,
}

impl MockProvider {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    pub fn issuer(&self) -> String {
        self.server.base_url()
    }

    pub async fn serve_discovery(&self) -> Mock<'_> {
        let jwks_uri = self.server.url(JWKS_PATH);
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(DISCOVERY_PATH);
                then.status(200).json_body(json!({
                    "issuer": self.server.base_url(),
                    "jwks_uri": jwks_uri,
                    "id_token_signing_alg_values_supported": ["RS256"]
                }));
            })
            .await
    }

    pub async fn serve_keys(&self) -> Mock<'_> {
        let key = provider_key();
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(JWKS_PATH);
                then.status(200).json_body(json!({
                    "keys": [
                        {
                            "kid": KID,
                            "kty": "RSA",
                            "alg": "RS256",
                            "use": "sig",
                            "n": key.modulus,
                            "e": key.exponent
                        }
                    ]
                }));
            })
            .await
    }
}
