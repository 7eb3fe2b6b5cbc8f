use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult, ClaimError};

/// The registered and provider-specific claims this crate knows how to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Claim {
    Issuer,
    Audience,
    ClientId,
    Expiration,
    IssuedAt,
    Nonce,
}

impl Claim {
    /// Name of the claim inside the token payload.
    pub fn key(&self) -> &'static str {
        match self {
            Claim::Issuer => "iss",
            Claim::Audience => "aud",
            Claim::ClientId => "cid",
            Claim::Expiration => "exp",
            Claim::IssuedAt => "iat",
            Claim::Nonce => "nonce",
        }
    }

    /// Human readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Claim::Issuer => "Issuer",
            Claim::Audience => "Audience",
            Claim::ClientId => "Client Id",
            Claim::Expiration => "Expiration",
            Claim::IssuedAt => "Issued At",
            Claim::Nonce => "Nonce",
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded token payload. Values keep their JSON type; use the typed
/// accessors to read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the claim only when it is a JSON string.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Reads a NumericDate claim (seconds since the epoch, integer or float).
    pub fn numeric_date(&self, claim: &'static str) -> Result<f64, ClaimError> {
        numeric_date(claim, self.0.get(claim))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.datetime("exp")
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.datetime("iat")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn datetime(&self, claim: &'static str) -> Option<DateTime<Utc>> {
        let seconds = self.numeric_date(claim).ok()?;
        Utc.timestamp_opt(seconds.trunc() as i64, 0).single()
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl TryFrom<Value> for ClaimSet {
    type Error = AuthError;

    fn try_from(value: Value) -> AuthResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AuthError::InvalidJson(format!(
                "expected a JSON object, found {}",
                json_type(&other)
            ))),
        }
    }
}

/// Converts a raw claim value into a NumericDate.
pub(crate) fn numeric_date(claim: &'static str, value: Option<&Value>) -> Result<f64, ClaimError> {
    match value {
        None | Some(Value::Null) => Err(ClaimError::Missing(claim)),
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| ClaimError::NotNumeric {
            claim,
            value: number.to_string(),
        }),
        Some(other) => Err(ClaimError::NotNumeric {
            claim,
            value: other.to_string(),
        }),
    }
}

/// Renders a claim value for error messages.
pub(crate) fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "<missing>".to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
