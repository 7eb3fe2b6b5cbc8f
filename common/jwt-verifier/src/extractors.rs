use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};

use crate::claims::ClaimSet;
use crate::error::{AuthError, AuthResult, VerificationError};
use crate::verifier::JwtVerifier;

/// Bearer access token verified with [`JwtVerifier::verify_access_token`].
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub claims: ClaimSet,
    pub token: String,
}

/// Bearer identity token verified with [`JwtVerifier::verify_id_token`].
#[derive(Debug, Clone)]
pub struct IdToken {
    pub claims: ClaimSet,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AccessToken
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = VerificationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);
        let token = bearer_token(parts)?;
        let result = verifier.verify_access_token(&token).await?;

        Ok(Self {
            claims: result.into_claims(),
            token,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for IdToken
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = VerificationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);
        let token = bearer_token(parts)?;
        let result = verifier.verify_id_token(&token).await?;

        Ok(Self {
            claims: result.into_claims(),
            token,
        })
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header. The
/// scheme name is matched case-insensitively; a blank token is passed on so
/// the verifier reports it as empty.
fn bearer_token(parts: &Parts) -> AuthResult<String> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.trim().to_owned())
}
