use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::claims::{Claim, ClaimSet};
use crate::config::VerifierConfig;
use crate::decoder::{JwksSignatureDecoder, SignatureDecoder};
use crate::discovery::{metadata_url, Discovery, OidcDiscovery};
use crate::error::{AuthError, AuthResult, VerificationError};
use crate::jwks::JwksFetcher;
use crate::metadata::{HttpMetadataResolver, MetadataResolver};
use crate::shape::validate_shape;
use crate::validation::{ClaimsValidator, ACCESS_TOKEN_CHECKS, ID_TOKEN_CHECKS};

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// Decoded claims plus whether every configured check passed.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    claims: ClaimSet,
    valid: bool,
}

impl VerificationResult {
    fn accepted(claims: ClaimSet) -> Self {
        Self {
            claims,
            valid: true,
        }
    }

    fn rejected(claims: ClaimSet) -> Self {
        Self {
            claims,
            valid: false,
        }
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn into_claims(self) -> ClaimSet {
        self.claims
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenFlow {
    Access,
    Id,
}

impl TokenFlow {
    fn checks(&self) -> &'static [Claim] {
        match self {
            TokenFlow::Access => ACCESS_TOKEN_CHECKS,
            TokenFlow::Id => ID_TOKEN_CHECKS,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TokenFlow::Access => "access_token",
            TokenFlow::Id => "id_token",
        }
    }
}

/// Verifies access and identity tokens issued by a single trusted issuer.
///
/// Holds no mutable state and can be shared across tasks. Every call fetches
/// discovery metadata and the key set again; nothing is memoized.
#[derive(Clone)]
pub struct JwtVerifier {
    config: VerifierConfig,
    discovery: Arc<dyn Discovery>,
    resolver: Arc<dyn MetadataResolver>,
    decoder: Arc<dyn SignatureDecoder>,
    clock: Arc<dyn Clock>,
}

impl JwtVerifier {
    /// Verifier with OIDC discovery and the HTTP/JWKS collaborators.
    pub fn new(config: VerifierConfig) -> AuthResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: VerifierConfig) -> JwtVerifierBuilder {
        JwtVerifierBuilder::new(config)
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn discovery(&self) -> &dyn Discovery {
        self.discovery.as_ref()
    }

    pub fn metadata_url(&self) -> String {
        metadata_url(&self.config.issuer, self.discovery.as_ref())
    }

    /// Verifies an access token: iss, aud, cid, exp, iat.
    ///
    /// Any shape failure, including an empty token, is reported as
    /// [`AuthError::InvalidToken`].
    pub async fn verify_access_token(
        &self,
        token: &str,
    ) -> Result<VerificationResult, VerificationError> {
        match validate_shape(token) {
            Ok(true) => {}
            Ok(false) => {
                return Err(self.malformed(TokenFlow::Access, AuthError::MalformedToken))
            }
            Err(err) => return Err(self.malformed(TokenFlow::Access, err)),
        }
        self.verify_claims(token, TokenFlow::Access).await
    }

    /// Verifies an identity token: iss, aud, exp, iat, nonce.
    ///
    /// Shape failures are returned as-is, so an empty token surfaces as
    /// [`AuthError::EmptyToken`] and a malformed one as
    /// [`AuthError::MalformedToken`].
    pub async fn verify_id_token(
        &self,
        token: &str,
    ) -> Result<VerificationResult, VerificationError> {
        if !validate_shape(token)? {
            debug!(flow = TokenFlow::Id.as_str(), "token rejected by shape check");
            return Err(AuthError::MalformedToken.into());
        }
        self.verify_claims(token, TokenFlow::Id).await
    }

    fn malformed(&self, flow: TokenFlow, reason: AuthError) -> VerificationError {
        debug!(flow = flow.as_str(), %reason, "token rejected by shape check");
        AuthError::InvalidToken(Box::new(reason)).into()
    }

    async fn verify_claims(
        &self,
        token: &str,
        flow: TokenFlow,
    ) -> Result<VerificationResult, VerificationError> {
        let claims = self.decode(token).await?;

        let validator = ClaimsValidator::new(&self.config, self.clock.now_unix());
        match validator.validate(&claims, flow.checks()) {
            Ok(()) => {
                debug!(flow = flow.as_str(), "token verified");
                Ok(VerificationResult::accepted(claims))
            }
            Err(err) => {
                debug!(
                    flow = flow.as_str(),
                    claim = err.claim().map(|claim| claim.key()),
                    error = %err,
                    "token claims rejected"
                );
                Err(VerificationError::with_result(
                    err,
                    VerificationResult::rejected(claims),
                ))
            }
        }
    }

    async fn decode(&self, token: &str) -> AuthResult<ClaimSet> {
        let url = self.metadata_url();
        let metadata = self.resolver.resolve(&url).await?;

        self.decoder
            .decode(token, &metadata.jwks_uri)
            .await
            .map_err(|err| AuthError::Decode(Box::new(err)))
    }
}

pub struct JwtVerifierBuilder {
    config: VerifierConfig,
    discovery: Arc<dyn Discovery>,
    resolver: Option<Arc<dyn MetadataResolver>>,
    decoder: Option<Arc<dyn SignatureDecoder>>,
    clock: Arc<dyn Clock>,
}

impl JwtVerifierBuilder {
    fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            discovery: Arc::new(OidcDiscovery),
            resolver: None,
            decoder: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_discovery(mut self, discovery: impl Discovery + 'static) -> Self {
        self.discovery = Arc::new(discovery);
        self
    }

    pub fn with_metadata_resolver(mut self, resolver: impl MetadataResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_signature_decoder(mut self, decoder: impl SignatureDecoder + 'static) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> AuthResult<JwtVerifier> {
        if self.config.issuer.trim().is_empty() {
            return Err(AuthError::Config("issuer must not be empty".to_string()));
        }
        if self.config.leeway_seconds < 0 {
            warn!(
                leeway_seconds = self.config.leeway_seconds,
                "negative leeway tightens exp and iat checks"
            );
        }

        let resolver: Arc<dyn MetadataResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(HttpMetadataResolver::new(self.config.http_timeout)?),
        };
        let decoder: Arc<dyn SignatureDecoder> = match self.decoder {
            Some(decoder) => decoder,
            None => {
                let client = reqwest::Client::builder()
                    .timeout(self.config.http_timeout)
                    .build()
                    .map_err(|err| {
                        AuthError::Config(format!("failed to build HTTP client: {err}"))
                    })?;
                Arc::new(JwksSignatureDecoder::new(JwksFetcher::with_client(client)))
            }
        };

        Ok(JwtVerifier {
            config: self.config,
            discovery: self.discovery,
            resolver,
            decoder,
            clock: self.clock,
        })
    }
}
