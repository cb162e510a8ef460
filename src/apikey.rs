use std::fmt;
use std::sync::Arc;

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-api-key";

/// ApiKey is the opaque credential shared by a client and every
/// store-scoped client derived from it. Cloning shares the same key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    /// Create a new ApiKey from its secret text
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        ApiKey(key.into())
    }

    /// The raw key, as sent in the `x-api-key` header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        ApiKey::new(key)
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        ApiKey::new(key)
    }
}

// Implement Debug manually to avoid exposing the key
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&"<redacted>").finish()
    }
}
