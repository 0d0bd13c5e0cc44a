//! Publishable API key.

use crate::error::ApiError;

const SECRET_KEY_PREFIX: &str = "sk_";

/// A validated publishable (client-side) API key.
///
/// Construction rejects empty keys and secret keys, so holding a
/// `PublishableKey` means the credential is safe to send from a client.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublishableKey(String);

impl PublishableKey {
    /// Validates and wraps a key.
    pub fn new(key: impl Into<String>) -> Result<Self, ApiError> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(ApiError::authentication(
                "Invalid Publishable Key: You must use a valid publishable key to create a token.",
            ));
        }
        if trimmed.starts_with(SECRET_KEY_PREFIX) {
            return Err(ApiError::authentication(
                "Invalid Publishable Key: You are using a secret key instead of a publishable one. \
                 Secret keys must never be used from a client.",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Validates an optional key; `None` is rejected like an empty key.
    pub fn from_option(key: Option<&str>) -> Result<Self, ApiError> {
        Self::new(key.unwrap_or_default())
    }

    /// Returns the raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a test-mode key.
    pub fn is_test_mode(&self) -> bool {
        self.0.starts_with("pk_test_")
    }
}

// Keys never show up in logs.
impl std::fmt::Debug for PublishableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.is_test_mode() { "test" } else { "live" };
        write!(f, "PublishableKey({mode}, ****)")
    }
}

impl std::str::FromStr for PublishableKey {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        let result = PublishableKey::new("");
        assert!(matches!(result, Err(ApiError::Authentication { .. })));
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(PublishableKey::new("   ").is_err());
    }

    #[test]
    fn test_missing_key_rejected() {
        let result = PublishableKey::from_option(None);
        assert!(matches!(result, Err(ApiError::Authentication { .. })));
    }

    #[test]
    fn test_secret_key_rejected() {
        let result = PublishableKey::new("sk_default");
        assert!(matches!(result, Err(ApiError::Authentication { .. })));
    }

    #[test]
    fn test_publishable_key_accepted() {
        let key = PublishableKey::new("pk_test_abc").unwrap();
        assert_eq!(key.as_str(), "pk_test_abc");
        assert!(key.is_test_mode());
    }

    #[test]
    fn test_debug_hides_key() {
        let key: PublishableKey = "pk_live_abc123".parse().unwrap();
        let shown = format!("{:?}", key);
        assert!(!shown.contains("abc123"));
        assert!(shown.contains("live"));
    }
}
