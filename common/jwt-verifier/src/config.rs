use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AuthError, AuthResult};

/// Default clock skew tolerance (two minutes).
pub const DEFAULT_LEEWAY_SECONDS: i64 = 120;

/// Default deadline for each outbound HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Claims that may be pinned to an expected value.
pub const CHECKABLE_CLAIMS: &[&str] = &["iss", "aud", "cid", "nonce"];

/// How the `iat` claim is compared against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssuedAtRule {
    /// Reject tokens issued more than `leeway` seconds in the future.
    #[default]
    NotInFuture,
    /// Reject when `iat` is more than `leeway` seconds in the past, i.e. the
    /// expiry comparison applied to `iat`. Kept for deployments relying on
    /// the older behaviour.
    ExpiryComparison,
}

impl FromStr for IssuedAtRule {
    type Err = AuthError;

    fn from_str(value: &str) -> AuthResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "not_in_future" | "future" => Ok(IssuedAtRule::NotInFuture),
            "expiry" | "expiry_comparison" => Ok(IssuedAtRule::ExpiryComparison),
            other => Err(AuthError::Config(format!(
                "unsupported issued-at rule '{other}'. Use not_in_future or expiry."
            ))),
        }
    }
}

/// Immutable configuration for a [`crate::JwtVerifier`].
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Trusted issuer; discovery metadata is fetched relative to this URL.
    pub issuer: String,
    /// Clock skew tolerance in seconds, applied to `exp` and `iat`.
    pub leeway_seconds: i64,
    pub issued_at_rule: IssuedAtRule,
    pub http_timeout: Duration,
    claims_to_validate: HashMap<String, String>,
}

impl VerifierConfig {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            issued_at_rule: IssuedAtRule::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            claims_to_validate: HashMap::new(),
        }
    }

    /// Adjust the allowed leeway. Negative values tighten both time checks.
    pub fn with_leeway(mut self, seconds: i64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    pub fn with_issued_at_rule(mut self, rule: IssuedAtRule) -> Self {
        self.issued_at_rule = rule;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_expected_issuer(self, value: impl Into<String>) -> Self {
        self.pin("iss", value.into())
    }

    pub fn with_audience(self, value: impl Into<String>) -> Self {
        self.pin("aud", value.into())
    }

    pub fn with_client_id(self, value: impl Into<String>) -> Self {
        self.pin("cid", value.into())
    }

    pub fn with_nonce(self, value: impl Into<String>) -> Self {
        self.pin("nonce", value.into())
    }

    /// Pin a claim by name. Only `iss`, `aud`, `cid` and `nonce` are accepted.
    pub fn with_claim(self, name: &str, value: impl Into<String>) -> AuthResult<Self> {
        if !CHECKABLE_CLAIMS.contains(&name) {
            return Err(AuthError::Config(format!(
                "claim '{name}' cannot be validated. Supported claims: {}",
                CHECKABLE_CLAIMS.join(", ")
            )));
        }
        Ok(self.pin(name, value.into()))
    }

    pub fn with_claims<I, K, V>(self, claims: I) -> AuthResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        claims
            .into_iter()
            .try_fold(self, |config, (name, value)| config.with_claim(name.as_ref(), value))
    }

    /// Expected value for a claim, or `None` when the claim is not checked.
    pub fn expected_claim(&self, name: &str) -> Option<&str> {
        self.claims_to_validate
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn claims_to_validate(&self) -> &HashMap<String, String> {
        &self.claims_to_validate
    }

    /// Load configuration from `JWT_*` environment variables.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).and_then(|value| normalize_optional(&value));

        let issuer = read("JWT_ISSUER")
            .ok_or_else(|| AuthError::Config("JWT_ISSUER must be set".to_string()))?;
        let mut config = Self::new(issuer);

        if let Some(value) = read("JWT_LEEWAY_SECONDS") {
            let seconds = value.parse::<i64>().map_err(|err| {
                AuthError::Config(format!("invalid JWT_LEEWAY_SECONDS '{value}': {err}"))
            })?;
            config = config.with_leeway(seconds);
        }

        if let Some(value) = read("JWT_ISSUED_AT_RULE") {
            config = config.with_issued_at_rule(value.parse()?);
        }

        if let Some(value) = read("JWT_HTTP_TIMEOUT_SECS") {
            let seconds = value.parse::<u64>().map_err(|err| {
                AuthError::Config(format!("invalid JWT_HTTP_TIMEOUT_SECS '{value}': {err}"))
            })?;
            config = config.with_http_timeout(Duration::from_secs(seconds));
        }

        for (key, claim) in [
            ("JWT_EXPECTED_ISSUER", "iss"),
            ("JWT_EXPECTED_AUDIENCE", "aud"),
            ("JWT_EXPECTED_CLIENT_ID", "cid"),
            ("JWT_EXPECTED_NONCE", "nonce"),
        ] {
            if let Some(value) = read(key) {
                config = config.pin(claim, value);
            }
        }

        Ok(config)
    }

    fn pin(mut self, name: &str, value: String) -> Self {
        self.claims_to_validate.insert(name.to_string(), value);
        self
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_once_at_construction() {
        let config = VerifierConfig::new("https://example.okta.com");
        assert_eq!(config.leeway_seconds, 120);
        assert_eq!(config.issued_at_rule, IssuedAtRule::NotInFuture);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert!(config.claims_to_validate().is_empty());
    }

    #[test]
    fn empty_expected_value_disables_the_check() {
        let config = VerifierConfig::new("issuer")
            .with_audience("")
            .with_client_id("myclient");
        assert_eq!(config.expected_claim("aud"), None);
        assert_eq!(config.expected_claim("cid"), Some("myclient"));
        assert_eq!(config.expected_claim("nonce"), None);
    }

    #[test]
    fn with_claim_rejects_unknown_claims() {
        let err = VerifierConfig::new("issuer")
            .with_claim("sub", "someone")
            .expect_err("sub is not checkable");
        assert!(matches!(err, AuthError::Config(_)));

        let config = VerifierConfig::new("issuer")
            .with_claims([("iss", "issuer"), ("nonce", "n-0S6_WzA2Mj")])
            .expect("supported claims");
        assert_eq!(config.expected_claim("iss"), Some("issuer"));
        assert_eq!(config.expected_claim("nonce"), Some("n-0S6_WzA2Mj"));
    }

    #[test]
    fn from_lookup_reads_all_settings() {
        let vars = HashMap::from([
            ("JWT_ISSUER", "https://example.okta.com/oauth2/default"),
            ("JWT_LEEWAY_SECONDS", "30"),
            ("JWT_ISSUED_AT_RULE", "expiry"),
            ("JWT_HTTP_TIMEOUT_SECS", "3"),
            ("JWT_EXPECTED_AUDIENCE", "api://default"),
            ("JWT_EXPECTED_CLIENT_ID", " "),
        ]);
        let config = VerifierConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("config loads");

        assert_eq!(config.issuer, "https://example.okta.com/oauth2/default");
        assert_eq!(config.leeway_seconds, 30);
        assert_eq!(config.issued_at_rule, IssuedAtRule::ExpiryComparison);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.expected_claim("aud"), Some("api://default"));
        assert_eq!(config.expected_claim("cid"), None);
    }

    #[test]
    fn from_lookup_requires_issuer_and_valid_numbers() {
        let err = VerifierConfig::from_lookup(|_| None).expect_err("issuer missing");
        assert!(matches!(err, AuthError::Config(_)));

        let err = VerifierConfig::from_lookup(|key| match key {
            "JWT_ISSUER" => Some("issuer".to_string()),
            "JWT_LEEWAY_SECONDS" => Some("two minutes".to_string()),
            _ => None,
        })
        .expect_err("leeway must be numeric");
        assert!(matches!(err, AuthError::Config(_)));
    }
}
