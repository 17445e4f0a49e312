use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::client::{Blob, Credentials, DashboardApi, Endpoint, MetricQuery};
use crate::error::AppError;
use crate::models::login::{LoginRequest, LoginResponse};

/// Shared, credential-free handle on the analytics backend.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("admisiones/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(BackendClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Exchange username/password for a bearer token. A 401 here means bad
    /// credentials, not an expired session, so it is reported as a backend
    /// error carrying the server's message.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AppError> {
        let resp = self
            .http
            .post(self.url("/api/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(error_from_body(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| AppError::Decode(format!("/api/auth/login: {e}")))
    }

    /// True when the backend answers at all, whatever the status.
    pub async fn ping(&self) -> bool {
        self.http.get(self.url("/api/auth/me")).send().await.is_ok()
    }

    pub fn with_credentials(&self, credentials: Arc<dyn Credentials>) -> MetricFetcher {
        MetricFetcher {
            client: self.clone(),
            credentials,
        }
    }
}

/// Authenticated fetcher for one credential.
pub struct MetricFetcher {
    client: BackendClient,
    credentials: Arc<dyn Credentials>,
}

impl MetricFetcher {
    fn request(&self, builder: RequestBuilder, query: &MetricQuery) -> RequestBuilder {
        let now_ms = chrono::Utc::now().timestamp_millis();
        builder.query(&query.to_pairs(now_ms))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let token = self
            .credentials
            .token()
            .await
            .ok_or(AppError::Unauthorized)?;

        let resp = builder
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Backend rejected the bearer token, clearing stored credential");
            self.credentials.clear().await;
            return Err(AppError::Unauthorized);
        }
        if !resp.status().is_success() {
            return Err(error_from_body(resp).await);
        }
        Ok(resp)
    }

    async fn json_body(endpoint: Endpoint, resp: Response) -> Result<Value, AppError> {
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AppError::Decode(format!("{}: {e}", endpoint.path())))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Decode(format!("{}: {e}", endpoint.path())))
    }
}

#[async_trait]
impl DashboardApi for MetricFetcher {
    async fn get_json(&self, endpoint: Endpoint, query: &MetricQuery) -> Result<Value, AppError> {
        let builder = self.client.http.get(self.client.url(endpoint.path()));
        let resp = self.send(self.request(builder, query)).await?;
        Self::json_body(endpoint, resp).await
    }

    async fn post_json(
        &self,
        endpoint: Endpoint,
        query: &MetricQuery,
        body: &Value,
    ) -> Result<Value, AppError> {
        let builder = self.client.http.post(self.client.url(endpoint.path())).json(body);
        let resp = self.send(self.request(builder, query)).await?;
        Self::json_body(endpoint, resp).await
    }

    async fn get_blob(&self, endpoint: Endpoint, query: &MetricQuery) -> Result<Blob, AppError> {
        let builder = self.client.http.get(self.client.url(endpoint.path()));
        let resp = self.send(self.request(builder, query)).await?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Blob {
            content_type,
            filename,
            bytes: bytes.to_vec(),
        })
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_decode() {
        AppError::Decode(err.to_string())
    } else {
        AppError::Network(err.to_string())
    }
}

/// Build the error for a non-success response from its body's `detail`,
/// falling back to a generic message.
async fn error_from_body(resp: Response) -> AppError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| detail_message(&v))
        .unwrap_or_else(|| format!("Request failed with status {status}"));
    AppError::Backend { status, detail }
}

fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        // Validation errors come as a list of {loc, msg, type}
        Some(Value::Array(items)) => {
            if let Some(msg) = items
                .first()
                .and_then(|item| item.get("msg"))
                .and_then(|m| m.as_str())
            {
                return Some(msg.to_string());
            }
        }
        _ => {}
    }
    ["error", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn filename_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
