use serde_json::Value;

use crate::claims::{display_value, numeric_date, Claim, ClaimSet};
use crate::config::{IssuedAtRule, VerifierConfig};
use crate::error::{AuthError, AuthResult, ClaimError};

/// Checks run against access tokens, in order.
pub const ACCESS_TOKEN_CHECKS: &[Claim] = &[
    Claim::Issuer,
    Claim::Audience,
    Claim::ClientId,
    Claim::Expiration,
    Claim::IssuedAt,
];

/// Checks run against identity tokens, in order.
pub const ID_TOKEN_CHECKS: &[Claim] = &[
    Claim::Issuer,
    Claim::Audience,
    Claim::Expiration,
    Claim::IssuedAt,
    Claim::Nonce,
];

/// Semantic claim checks evaluated at a fixed point in time.
///
/// Pinned-value checks (`iss`, `aud`, `cid`, `nonce`) are skipped when no
/// expected value is configured; `exp` and `iat` are always enforced.
#[derive(Debug, Clone, Copy)]
pub struct ClaimsValidator<'a> {
    config: &'a VerifierConfig,
    now: i64,
}

impl<'a> ClaimsValidator<'a> {
    pub fn new(config: &'a VerifierConfig, now: i64) -> Self {
        Self { config, now }
    }

    /// Runs `checks` in order and stops at the first failure.
    pub fn validate(&self, claims: &ClaimSet, checks: &[Claim]) -> AuthResult<()> {
        checks
            .iter()
            .try_for_each(|claim| self.check(*claim, claims))
    }

    pub fn check(&self, claim: Claim, claims: &ClaimSet) -> AuthResult<()> {
        let value = claims.get(claim.key());
        let outcome = match claim {
            Claim::Issuer => self.validate_issuer(value),
            Claim::Audience => self.validate_audience(value),
            Claim::ClientId => self.validate_client_id(value),
            Claim::Nonce => self.validate_nonce(value),
            Claim::Expiration => self.validate_expiry(value),
            Claim::IssuedAt => self.validate_issued_at(value),
        };
        outcome.map_err(|source| AuthError::Claim { claim, source })
    }

    pub fn validate_issuer(&self, value: Option<&Value>) -> Result<(), ClaimError> {
        self.expect_pinned("iss", "iss", value)
    }

    pub fn validate_audience(&self, value: Option<&Value>) -> Result<(), ClaimError> {
        self.expect_pinned("aud", "aud", value)
    }

    pub fn validate_client_id(&self, value: Option<&Value>) -> Result<(), ClaimError> {
        self.expect_pinned("cid", "clientId", value)
    }

    pub fn validate_nonce(&self, value: Option<&Value>) -> Result<(), ClaimError> {
        self.expect_pinned("nonce", "nonce", value)
    }

    /// Fails when `now - leeway > exp`.
    pub fn validate_expiry(&self, value: Option<&Value>) -> Result<(), ClaimError> {
        let exp = numeric_date("exp", value)?;
        not_before_cutoff(self.now.saturating_sub(self.config.leeway_seconds), exp)
    }

    /// Applies the configured [`IssuedAtRule`] to `iat`.
    pub fn validate_issued_at(&self, value: Option<&Value>) -> Result<(), ClaimError> {
        let iat = numeric_date("iat", value)?;
        match self.config.issued_at_rule {
            IssuedAtRule::NotInFuture => {
                let latest = self.now.saturating_add(self.config.leeway_seconds);
                if (latest as f64) < iat {
                    Err(ClaimError::IssuedInFuture)
                } else {
                    Ok(())
                }
            }
            IssuedAtRule::ExpiryComparison => {
                not_before_cutoff(self.now.saturating_sub(self.config.leeway_seconds), iat)
            }
        }
    }

    fn expect_pinned(
        &self,
        key: &str,
        label: &'static str,
        value: Option<&Value>,
    ) -> Result<(), ClaimError> {
        let Some(expected) = self.config.expected_claim(key) else {
            return Ok(());
        };

        match value {
            Some(Value::String(actual)) if actual == expected => Ok(()),
            other => Err(ClaimError::Mismatch {
                label,
                actual: display_value(other),
                expected: expected.to_string(),
            }),
        }
    }
}

fn not_before_cutoff(cutoff: i64, timestamp: f64) -> Result<(), ClaimError> {
    if cutoff as f64 > timestamp {
        Err(ClaimError::Expired)
    } else {
        Ok(())
    }
}
