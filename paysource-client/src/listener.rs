use paysource_types::{ApiError, ApiResponse, ResponseListener};

/// Listener that reports every completed call through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl ResponseListener for TracingListener {
    fn on_response(&self, response: &ApiResponse) {
        tracing::debug!(
            status = response.status,
            request_id = response.request_id.as_deref().unwrap_or("-"),
            bytes = response.body.len(),
            "API response received"
        );
    }

    fn on_error(&self, error: &ApiError) {
        tracing::warn!(
            kind = error.kind(),
            status = error.status(),
            request_id = error.request_id().unwrap_or("-"),
            "API call failed: {}",
            error
        );
    }
}
