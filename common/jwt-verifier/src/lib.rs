pub mod claims;
pub mod config;
pub mod decoder;
pub mod discovery;
pub mod error;
pub mod extractors;
pub mod jwks;
pub mod metadata;
pub mod shape;
pub mod validation;
pub mod verifier;

pub use claims::{Claim, ClaimSet};
pub use config::{IssuedAtRule, VerifierConfig, DEFAULT_LEEWAY_SECONDS};
pub use decoder::{JwksSignatureDecoder, SignatureDecoder};
pub use discovery::{Discovery, OAuthDiscovery, OidcDiscovery};
pub use error::{AuthError, AuthResult, ClaimError, ErrorKind, VerificationError};
pub use extractors::{AccessToken, IdToken};
pub use jwks::JwksFetcher;
pub use metadata::{HttpMetadataResolver, MetadataResolver, ProviderMetadata};
pub use shape::{validate_shape, SUPPORTED_ALGORITHM};
pub use validation::{ClaimsValidator, ACCESS_TOKEN_CHECKS, ID_TOKEN_CHECKS};
pub use verifier::{
    Clock, FixedClock, JwtVerifier, JwtVerifierBuilder, SystemClock, VerificationResult,
};
