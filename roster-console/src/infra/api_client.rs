use log::{debug, info, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode, header};
use roster_config::{Credential, ServerConfig, util::normalize_base_url};
use roster_model::ServerMessage;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failures at the HTTP boundary, before any console-level classification.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("invalid server URL '{raw}'")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {path} failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {path} was redirected (HTTP {status})")]
    Redirect {
        path: String,
        status: u16,
        location: Option<String>,
    },
    #[error("request to {path} failed with HTTP {status}")]
    Status {
        path: String,
        status: u16,
        message: Option<String>,
    },
    #[error("failed to decode response from {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Redirect { status, .. } | ApiError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Operator-facing message the server attached to a failed response.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// HTTP client for the console's REST backend.
///
/// Redirects are never followed: the backend answers unauthenticated calls
/// with a redirect to its login page, and that has to reach the caller as a
/// response.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credential: Arc<RwLock<Option<Credential>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field(
                "has_credential",
                &self
                    .credential
                    .try_read()
                    .map(|c| c.is_some())
                    .unwrap_or(false),
            )
            .finish()
    }
}

impl ApiClient {
    /// Client with default timeouts and no credential.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let server = ServerConfig {
            base_url: base_url.into(),
            ..ServerConfig::default()
        };
        Self::with_settings(&server, None)
    }

    pub fn with_settings(
        server: &ServerConfig,
        credential: Option<Credential>,
    ) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&server.base_url).map_err(|source| {
            ApiError::InvalidBaseUrl {
                raw: server.base_url.clone(),
                source,
            }
        })?;
        if base_url != server.base_url {
            warn!(
                "[ApiClient] Normalized base URL from '{}' to '{}'",
                server.base_url, base_url
            );
        }

        let client = Client::builder()
            .timeout(server.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(server.accept_invalid_certs)
            .build()
            .map_err(ApiError::Client)?;

        info!(
            "[ApiClient] Creating API client with base URL: {}",
            base_url
        );

        Ok(Self {
            client,
            base_url,
            credential: Arc::new(RwLock::new(credential)),
        })
    }

    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let p = path.as_ref();
        if p.starts_with("http://") || p.starts_with("https://") {
            return p.to_string();
        }
        format!("{}/{}", self.base_url, p.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_credential(&self, credential: Option<Credential>) {
        *self.credential.write().await = credential;
    }

    /// Attach the configured credential, if any.
    pub async fn build_request(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credential.read().await.as_ref() {
            Some(Credential::Bearer(token)) => builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.as_str()),
            ),
            Some(Credential::SessionCookie(cookie)) => {
                builder.header(header::COOKIE, cookie.as_str())
            }
            None => builder,
        }
    }

    async fn execute_request<R: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<R, ApiError> {
        let transport = |source| ApiError::Transport {
            path: path.to_string(),
            source,
        };

        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            warn!(
                "[ApiClient] {} redirected to {}",
                path,
                location.as_deref().unwrap_or("<no location>")
            );
            return Err(ApiError::Redirect {
                path: path.to_string(),
                status: status.as_u16(),
                location,
            });
        }

        let body = response.text().await.map_err(transport)?;

        if status.is_success() {
            let payload = if body.trim().is_empty() { "null" } else { &body };
            return serde_json::from_str(payload).map_err(|source| {
                ApiError::Decode {
                    path: path.to_string(),
                    source,
                }
            });
        }

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!("[ApiClient] {} rejected the session ({})", path, status);
        }

        Err(ApiError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            message: ServerMessage::from_body(&body),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.build_url(path);
        debug!("[ApiClient] {} {}", method, url);
        self.client.request(method, &url)
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let request = self.build_request(self.request(Method::GET, path)).await;
        self.execute_request(path, request).await
    }

    pub async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let request = self.request(Method::POST, path).json(body);
        let request = self.build_request(request).await;
        self.execute_request(path, request).await
    }

    pub async fn put<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let request = self.request(Method::PUT, path).json(body);
        let request = self.build_request(request).await;
        self.execute_request(path, request).await
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, ApiError> {
        let request =
            self.build_request(self.request(Method::DELETE, path)).await;
        self.execute_request(path, request).await
    }
}
