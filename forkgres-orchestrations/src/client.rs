//! Provider REST client
//!
//! Every request carries `Authorization: Basic base64(public:secret)`.
//! Failures are normalized into [`ForkError`] so callers can tell network,
//! API and malformed-response failures apart.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use forkgres_models::{ForkServiceRequest, Service};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{ForkError, Result};

/// Default base URL of the provider API
pub const DEFAULT_API_URL: &str = "https://console.cloud.timescale.com/public/api/v1";

/// Longest raw body excerpt carried in an API error
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Public/secret key pair used for basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    public_key: String,
    secret_key: String,
}

impl ApiCredentials {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// `PUBLIC:SECRET`, the form the key is supplied and persisted in
    pub fn to_key_string(&self) -> String {
        format!("{}:{}", self.public_key, self.secret_key)
    }

    /// Value of the `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(self.to_key_string()))
    }
}

impl FromStr for ApiCredentials {
    type Err = ForkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((public, secret)) if !public.is_empty() && !secret.is_empty() => {
                Ok(Self::new(public, secret))
            }
            _ => Err(ForkError::Validation(
                "api key must be in the form PUBLIC_KEY:SECRET_KEY".to_string(),
            )),
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("public_key", &self.public_key)
            .field("secret_key", &"***")
            .finish()
    }
}

/// Service operations the fork and teardown phases need
#[async_trait]
pub trait ServiceApi: Send + Sync {
    async fn fork_service(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ForkServiceRequest,
    ) -> Result<Service>;

    async fn get_service(&self, project_id: &str, service_id: &str) -> Result<Service>;

    async fn delete_service(&self, project_id: &str, service_id: &str) -> Result<()>;
}

/// reqwest-backed [`ServiceApi`]
pub struct CloudClient {
    client: reqwest::Client,
    base_url: String,
    credentials: ApiCredentials,
}

impl CloudClient {
    pub fn new(base_url: impl Into<String>, credentials: ApiCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one authenticated request and return the parsed JSON body.
    /// An empty body parses to `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, url = %url, "Sending provider request");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, self.credentials.authorization_header())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let network_error = |cause: reqwest::Error| ForkError::Network {
            method: method.to_string(),
            url: url.clone(),
            cause: cause.to_string(),
        };

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status();
        let text = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(api_error_from_body(status.as_u16(), &text));
        }

        parse_body(&url, &text)
    }

    async fn request_typed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let value = self.request(method, path, body).await?;
        serde_json::from_value(value).map_err(|e| ForkError::MalformedResponse {
            url,
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl ServiceApi for CloudClient {
    async fn fork_service(
        &self,
        project_id: &str,
        service_id: &str,
        request: &ForkServiceRequest,
    ) -> Result<Service> {
        let body = serde_json::to_value(request).map_err(|e| {
            ForkError::Validation(format!("Failed to encode fork request: {}", e))
        })?;
        self.request_typed(
            Method::POST,
            &format!("/projects/{}/services/{}/forkService", project_id, service_id),
            Some(&body),
        )
        .await
    }

    async fn get_service(&self, project_id: &str, service_id: &str) -> Result<Service> {
        self.request_typed(
            Method::GET,
            &format!("/projects/{}/services/{}", project_id, service_id),
            None,
        )
        .await
    }

    async fn delete_service(&self, project_id: &str, service_id: &str) -> Result<()> {
        self.request(
            Method::DELETE,
            &format!("/projects/{}/services/{}", project_id, service_id),
            None,
        )
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Build an [`ForkError::Api`] from a non-success response
pub fn api_error_from_body(status: u16, body: &str) -> ForkError {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            let code = match parsed.code {
                Some(serde_json::Value::String(code)) => code,
                Some(serde_json::Value::Null) | None => status.to_string(),
                Some(other) => other.to_string(),
            };
            return ForkError::Api {
                status,
                code,
                message,
            };
        }
    }

    ForkError::Api {
        status,
        code: status.to_string(),
        message: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
    }
}

fn parse_body(url: &str, text: &str) -> Result<serde_json::Value> {
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ForkError::MalformedResponse {
        url: url.to_string(),
        detail: format!("{} (body: {})", e, truncate_chars(text, MAX_ERROR_BODY_CHARS)),
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
