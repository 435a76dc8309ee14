use async_trait::async_trait;

use crate::error::Result;

/// Header used by the Generative Language API for key auth
pub const GOOGLE_API_KEY_HEADER: &str = "x-goog-api-key";

/// Authenticator trait for different authentication methods
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Get the authentication header (header_name, header_value)
    /// Returns None if no authentication is needed
    async fn get_auth_header(&self) -> Result<Option<(String, String)>>;
}

/// API Key authenticator
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    header: String,
    api_key: String,
}

impl ApiKeyAuth {
    /// Key sent in the `x-goog-api-key` header
    pub fn google(api_key: impl Into<String>) -> Self {
        Self {
            header: GOOGLE_API_KEY_HEADER.to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(Some((self.header.clone(), self.api_key.clone())))
    }
}

/// No authentication
#[derive(Debug, Clone)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(None)
    }
}
