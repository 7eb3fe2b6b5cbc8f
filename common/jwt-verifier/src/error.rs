use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::claims::Claim;
use crate::verifier::VerificationResult;

pub type AuthResult<T> = Result<T, AuthError>;

/// Coarse classification of a verification failure.
///
/// Callers should branch on this rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyToken,
    MalformedShape,
    MetadataFetchFailed,
    SignatureInvalid,
    ClaimMismatch,
    ClaimExpired,
    ClaimTimestampInvalid,
    Configuration,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::EmptyToken => "AUTH_EMPTY_TOKEN",
            ErrorKind::MalformedShape => "AUTH_MALFORMED_TOKEN",
            ErrorKind::MetadataFetchFailed => "AUTH_PROVIDER_UNAVAILABLE",
            ErrorKind::SignatureInvalid => "AUTH_SIGNATURE",
            ErrorKind::ClaimMismatch => "AUTH_CLAIM_MISMATCH",
            ErrorKind::ClaimExpired => "AUTH_TOKEN_EXPIRED",
            ErrorKind::ClaimTimestampInvalid => "AUTH_CLAIM_TIMESTAMP",
            ErrorKind::Configuration => "AUTH_CONFIG",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ErrorKind::MetadataFetchFailed => StatusCode::BAD_GATEWAY,
            ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Failure of a single claim check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClaimError {
    #[error("{label}: {actual} does not match {expected}")]
    Mismatch {
        label: &'static str,
        actual: String,
        expected: String,
    },
    #[error("the token is expired")]
    Expired,
    #[error("the token was issued in the future")]
    IssuedInFuture,
    #[error("claim '{0}' is missing")]
    Missing(&'static str),
    #[error("claim '{claim}' is not a numeric date: {value}")]
    NotNumeric { claim: &'static str, value: String },
}

impl ClaimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClaimError::Mismatch { .. } => ErrorKind::ClaimMismatch,
            ClaimError::Expired => ErrorKind::ClaimExpired,
            ClaimError::IssuedInFuture | ClaimError::Missing(_) | ClaimError::NotNumeric { .. } => {
                ErrorKind::ClaimTimestampInvalid
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT string is empty")]
    EmptyToken,
    #[error("token is not a well-formed RS256 JWT")]
    MalformedToken,
    #[error("token is not valid: {0}")]
    InvalidToken(#[source] Box<AuthError>),
    #[error("request for metadata was not successful: {0}")]
    MetadataFetch(String),
    #[error("failed to parse metadata response: {0}")]
    MetadataDecode(String),
    #[error("could not decode token: {0}")]
    Decode(#[source] Box<AuthError>),
    #[error("token missing kid header")]
    MissingKeyId,
    #[error("no signing key published for kid '{0}'")]
    UnknownKeyId(String),
    #[error("failed to decode token header: {0}")]
    InvalidHeader(String),
    #[error("token uses unsupported alg '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("failed to parse decoding key for kid '{0}': {1}")]
    KeyParse(String, String),
    #[error("failed to fetch JWKS: {0}")]
    JwksFetch(String),
    #[error("failed to parse JWKS response: {0}")]
    JwksDecode(String),
    #[error("JWKS key '{0}' missing required RSA components")]
    JwksMissingComponents(String),
    #[error("JWKS key '{kid}' uses unsupported key type '{kty}'")]
    JwksUnsupportedKey { kid: String, kty: String },
    #[error("JWKS key '{kid}' uses unsupported alg '{alg}'")]
    JwksUnsupportedAlg { kid: String, alg: String },
    #[error("the `{claim}` was not able to be validated. {source}")]
    Claim {
        claim: Claim,
        #[source]
        source: ClaimError,
    },
    #[error("invalid verifier configuration: {0}")]
    Config(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::EmptyToken | AuthError::MissingAuthorization => ErrorKind::EmptyToken,
            AuthError::InvalidToken(inner) => match **inner {
                AuthError::EmptyToken => ErrorKind::EmptyToken,
                _ => ErrorKind::MalformedShape,
            },
            AuthError::MalformedToken | AuthError::InvalidAuthorization => {
                ErrorKind::MalformedShape
            }
            AuthError::MetadataFetch(_)
            | AuthError::MetadataDecode(_)
            | AuthError::JwksFetch(_)
            | AuthError::JwksDecode(_) => ErrorKind::MetadataFetchFailed,
            AuthError::Decode(inner) => match inner.kind() {
                ErrorKind::MetadataFetchFailed => ErrorKind::MetadataFetchFailed,
                _ => ErrorKind::SignatureInvalid,
            },
            AuthError::MissingKeyId
            | AuthError::UnknownKeyId(_)
            | AuthError::InvalidHeader(_)
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::Verification(_)
            | AuthError::InvalidJson(_)
            | AuthError::KeyParse(_, _)
            | AuthError::JwksMissingComponents(_)
            | AuthError::JwksUnsupportedKey { .. }
            | AuthError::JwksUnsupportedAlg { .. } => ErrorKind::SignatureInvalid,
            AuthError::Claim { source, .. } => source.kind(),
            AuthError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// The claim whose check produced this error, if any.
    pub fn claim(&self) -> Option<Claim> {
        match self {
            AuthError::Claim { claim, .. } => Some(*claim),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Verification(value.to_string())
    }
}

/// Error returned by the verification flows.
///
/// Claim-stage failures carry the decoded (but untrusted) claims so callers
/// can log them. Anything carried here must not be used for authorization.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct VerificationError {
    error: AuthError,
    result: Option<VerificationResult>,
}

impl VerificationError {
    pub(crate) fn with_result(error: AuthError, result: VerificationResult) -> Self {
        Self {
            error,
            result: Some(result),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn error(&self) -> &AuthError {
        &self.error
    }

    pub fn result(&self) -> Option<&VerificationResult> {
        self.result.as_ref()
    }

    pub fn into_parts(self) -> (AuthError, Option<VerificationResult>) {
        (self.error, self.result)
    }
}

impl From<AuthError> for VerificationError {
    fn from(error: AuthError) -> Self {
        Self {
            error,
            result: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let body = ErrorBody {
            code: kind.code(),
            message: self.to_string(),
        };
        (kind.status(), Json(body)).into_response()
    }
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        self.error.into_response()
    }
}
