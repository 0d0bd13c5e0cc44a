//! reqwest adapter for the `Transport` port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use paysource_types::{ApiError, ApiRequest, ApiResponse, HttpMethod, Transport};

const USER_AGENT: &str = concat!("paysource-rust/", env!("CARGO_PKG_VERSION"));

/// HTTPS transport against a fixed API base.
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the given base URL and timeout.
    ///
    /// Idle connections are not pooled, so one transport can serve both the
    /// caller's runtime and the private runtimes of blocking calls.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ApiError::connection(format!("Unable to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = match request.method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
        };
        req = req.bearer_auth(request.key.as_str());
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(form) = request.form {
            req = req
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(form);
        }

        let resp = req.send().await.map_err(connection_error)?;
        let status = resp.status().as_u16();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await.map_err(connection_error)?;

        Ok(ApiResponse {
            status,
            body,
            request_id,
        })
    }
}

fn connection_error(err: reqwest::Error) -> ApiError {
    let reason = if err.is_timeout() {
        "the request timed out"
    } else if err.is_connect() {
        "could not connect"
    } else {
        "the connection failed"
    };
    ApiError::connection(format!(
        "IOException during API request to the payments API: {} ({})",
        reason, err
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_trims_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_user_agent_names_crate_version() {
        assert!(USER_AGENT.starts_with("paysource-rust/"));
    }
}
