use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::{AuthError, AuthResult};
use crate::shape::SUPPORTED_ALGORITHM;

#[derive(Clone, Default)]
pub struct JwksFetcher {
    client: Client,
}

impl JwksFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> AuthResult<JwkSet> {
        let response = self.client.get(url).send().await.map_err(|err| {
            warn!(url, error = %err, "JWKS request failed");
            AuthError::JwksFetch(err.to_string())
        })?;

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "JWKS request rejected");
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|err| AuthError::JwksDecode(err.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: Option<String>,
    pub kty: Option<String>,
    pub alg: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

impl Jwk {
    /// Builds an RS256 decoding key from the RSA modulus and exponent.
    pub fn decoding_key(&self) -> AuthResult<DecodingKey> {
        let kid = self.kid.clone().unwrap_or_default();
        let kty = self.kty.clone().unwrap_or_else(|| "RSA".to_string());
        if kty != "RSA" {
            return Err(AuthError::JwksUnsupportedKey { kid, kty });
        }

        if let Some(alg) = &self.alg {
            if alg != SUPPORTED_ALGORITHM {
                return Err(AuthError::JwksUnsupportedAlg {
                    kid,
                    alg: alg.clone(),
                });
            }
        }

        let (Some(modulus), Some(exponent)) = (&self.n, &self.e) else {
            return Err(AuthError::JwksMissingComponents(kid));
        };

        DecodingKey::from_rsa_components(modulus, exponent)
            .map_err(|err| AuthError::KeyParse(kid, err.to_string()))
    }
}
