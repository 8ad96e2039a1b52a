use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use newzotero_core::util::compact_text;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::AppError;

/// Pooled client for the notes backend.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client,
    base_url: String,
}

/// A backend response read into memory.
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Upstream {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|err| AppError::internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.server_url.clone(),
        })
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{path}", self.base_url))
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<UpstreamReply, AppError> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(UpstreamReply {
            status,
            headers,
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<String>,
}

impl UpstreamReply {
    /// Turn a non-success reply into an [`AppError::Upstream`] with the
    /// backend's `error` text, or `fallback` when it has none.
    pub fn error_for_status(self, fallback: &str) -> Result<Self, AppError> {
        if self.status.is_success() {
            return Ok(self);
        }
        let message = serde_json::from_slice::<UpstreamErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| fallback.to_string());
        tracing::debug!(
            status = self.status.as_u16(),
            body = %compact_text(&String::from_utf8_lossy(&self.body)),
            "Backend rejected request"
        );
        Err(AppError::Upstream {
            status: self.status,
            message,
        })
    }

    /// Relay status, body and `Content-Type`, plus any `extra` headers.
    pub fn relay(self, default_type: &'static str, extra: &[header::HeaderName]) -> Response {
        let mut response = (self.status, self.body).into_response();
        let content_type = self
            .headers
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(default_type));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
        for name in extra {
            if let Some(value) = self.headers.get(name) {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }
        response
    }
}
