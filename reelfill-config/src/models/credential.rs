use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Credentials longer than this are treated as bearer tokens; shorter ones
/// are legacy API keys passed as a query parameter.
const BEARER_MIN_EXCLUSIVE_LEN: usize = 40;

/// How a credential is attached to an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <token>` header.
    Bearer,
    /// Provider-specific API key query parameter.
    QueryKey,
}

/// A secret API credential, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Wraps a raw secret. Blank input yields `None` so unset and empty
    /// environment variables behave the same.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn auth_style(&self) -> AuthStyle {
        if self.0.len() > BEARER_MIN_EXCLUSIVE_LEN {
            AuthStyle::Bearer
        } else {
            AuthStyle::QueryKey
        }
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiCredential").field(&"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        assert!(ApiCredential::new("").is_none());
        assert!(ApiCredential::new("   ").is_none());
    }

    #[test]
    fn long_credentials_use_bearer_auth() {
        let legacy = ApiCredential::new("0123456789abcdef0123456789abcdef")
            .expect("credential");
        let jwt = format!("eyJhbGciOiJIUzI1NiJ9.{}", "x".repeat(64));
        let token = ApiCredential::new(jwt).expect("credential");

        assert_eq!(legacy.auth_style(), AuthStyle::QueryKey);
        assert_eq!(token.auth_style(), AuthStyle::Bearer);
    }

    #[test]
    fn debug_output_never_leaks_the_secret() {
        let credential = ApiCredential::new("secret-value").expect("credential");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secret-value"));
    }
}
