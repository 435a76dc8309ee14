use reqwest::{header, Client, StatusCode};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::{ApiKeyAuth, Authenticator};
use crate::error::{LLMError, Result};
use crate::provider::GeminiConfig;
use crate::transformer::gemini::parse_error_message;

/// Shared HTTP plumbing for the Gemini and Imagen endpoints.
///
/// The API key is read once, when the client is built. A client without a
/// key never touches the network.
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: reqwest_middleware::ClientWithMiddleware,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl GeminiClient {
    /// Create a client reading the key from `config.api_key_env`
    pub fn from_env(config: GeminiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!(
                "Environment variable {} is not set, remote calls are disabled",
                config.api_key_env
            );
        }
        Self::new(config, api_key)
    }

    /// Create a client with an explicit key
    pub fn new(config: GeminiConfig, api_key: Option<String>) -> Result<Self> {
        let authenticator =
            api_key.map(|key| Arc::new(ApiKeyAuth::google(key)) as Arc<dyn Authenticator>);
        Self::with_authenticator(config, authenticator)
    }

    /// Create with a custom authenticator
    pub fn with_authenticator(
        config: GeminiConfig,
        authenticator: Option<Arc<dyn Authenticator>>,
    ) -> Result<Self> {
        // Create retry policy with exponential backoff
        let retry_policy = ExponentialBackoff::builder()
            .base(2)
            .build_with_max_retries(config.max_retries);

        let http_client = reqwest_middleware::ClientBuilder::new(
            Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| LLMError::Config(e.to_string()))?,
        )
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

        Ok(Self {
            config,
            http_client,
            authenticator,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn has_credential(&self) -> bool {
        self.authenticator.is_some()
    }

    /// Fail fast when no key was configured
    pub fn ensure_credential(&self) -> Result<&Arc<dyn Authenticator>> {
        self.authenticator
            .as_ref()
            .ok_or_else(|| LLMError::MissingCredential(self.config.api_key_env.clone()))
    }

    /// Build request headers
    async fn build_headers(&self) -> Result<header::HeaderMap> {
        let authenticator = self.ensure_credential()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        if let Some((header_name, header_value)) = authenticator.get_auth_header().await? {
            let name = header::HeaderName::from_bytes(header_name.as_bytes())
                .map_err(|e| LLMError::Config(format!("Invalid auth header name: {}", e)))?;
            let value = header::HeaderValue::from_str(&header_value)
                .map_err(|e| LLMError::Config(format!("Invalid auth header value: {}", e)))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// POST a JSON body to `models/{model}:{method}` and return the JSON reply
    pub async fn post_model(&self, model: &str, method: &str, body: &Value) -> Result<Value> {
        let headers = self.build_headers().await?;
        let url = self.config.endpoint(model, method);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))
    }
}

fn map_http_error(status: StatusCode, body: &str) -> LLMError {
    let message = parse_error_message(body);
    match status.as_u16() {
        401 | 403 => LLMError::Auth(message),
        429 => LLMError::RateLimited(message),
        code => LLMError::Api {
            status: code,
            message,
        },
    }
}
