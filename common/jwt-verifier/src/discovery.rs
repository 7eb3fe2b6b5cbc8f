/// Locates an identity provider's metadata document relative to its issuer.
pub trait Discovery: Send + Sync {
    /// Path appended to the issuer URL, including the leading slash.
    fn well_known_suffix(&self) -> &str;
}

/// OpenID Connect discovery (`/.well-known/openid-configuration`).
#[derive(Debug, Clone, Copy, Default)]
pub struct OidcDiscovery;

impl Discovery for OidcDiscovery {
    fn well_known_suffix(&self) -> &str {
        "/.well-known/openid-configuration"
    }
}

/// OAuth 2.0 authorization server metadata (RFC 8414).
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuthDiscovery;

impl Discovery for OAuthDiscovery {
    fn well_known_suffix(&self) -> &str {
        "/.well-known/oauth-authorization-server"
    }
}

/// Builds `{issuer}{suffix}`, dropping a trailing slash on the issuer so the
/// suffix is not doubled.
pub fn metadata_url(issuer: &str, discovery: &dyn Discovery) -> String {
    format!(
        "{}{}",
        issuer.trim_end_matches('/'),
        discovery.well_known_suffix()
    )
}
