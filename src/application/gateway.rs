//! Boundary to the upstream content API.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::domain::auth::BearerToken;

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path segments below the upstream base URL, unescaped.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub bearer: Option<BearerToken>,
    pub body: RequestBody,
}

impl UpstreamRequest {
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    pub fn bearer(mut self, bearer: Option<BearerToken>) -> Self {
        self.bearer = bearer;
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<UploadPart>),
}

#[derive(Debug, Clone)]
pub struct UploadPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Raw upstream answer. Non-2xx statuses are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Human-readable failure reason taken from the upstream error body.
    pub fn error_message(&self) -> String {
        self.json()
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| format!("Upstream request failed with status {}", self.status))
    }
}

fn extract_message(body: &Value) -> Option<String> {
    let text = |value: &Value| {
        value
            .as_str()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };

    body.get("message")
        .and_then(text)
        .or_else(|| {
            body.get("error").and_then(|error| {
                text(error).or_else(|| error.get("message").and_then(text))
            })
        })
        .or_else(|| body.get("messages").and_then(text))
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("upstream request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("upstream transport failure: {0}")]
    Transport(String),
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

#[async_trait]
pub trait UpstreamGateway: Send + Sync {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamReply, GatewayError>;
}
