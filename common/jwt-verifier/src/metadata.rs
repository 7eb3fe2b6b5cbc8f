use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::{AuthError, AuthResult};

/// The one field of the provider metadata document this crate consumes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderMetadata {
    pub jwks_uri: String,
}

/// Fetches provider metadata from a discovery URL.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> AuthResult<ProviderMetadata>;
}

/// Resolves metadata with a plain `GET`. Nothing is cached between calls.
#[derive(Clone)]
pub struct HttpMetadataResolver {
    client: Client,
}

impl HttpMetadataResolver {
    pub fn new(timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetadataResolver for HttpMetadataResolver {
    async fn resolve(&self, url: &str) -> AuthResult<ProviderMetadata> {
        let response = self.client.get(url).send().await.map_err(|err| {
            warn!(url, error = %err, "metadata request failed");
            AuthError::MetadataFetch(err.to_string())
        })?;

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "metadata request rejected");
            return Err(AuthError::MetadataFetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .json::<ProviderMetadata>()
            .await
            .map_err(|err| AuthError::MetadataDecode(err.to_string()))
    }
}
