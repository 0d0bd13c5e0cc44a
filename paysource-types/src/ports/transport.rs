//! Transport port: one network round trip.

use crate::domain::PublishableKey;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully assembled API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path below the API base, e.g. `/v1/sources`.
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Form-encoded body, for `POST` requests.
    pub form: Option<String>,
    pub key: PublishableKey,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>, key: PublishableKey) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
            form: None,
            key,
        }
    }

    pub fn post(path: impl Into<String>, form: String, key: PublishableKey) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            query: Vec::new(),
            form: Some(form),
            key,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// Raw HTTP response, before translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub request_id: Option<String>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one network round trip.
///
/// Implementations return `Ok` for every HTTP response, whatever its status,
/// and `Err(ApiError::ApiConnection)` only when no response was obtained.
/// They never retry.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}
