//! Observability hook.

use super::transport::ApiResponse;
use crate::error::ApiError;

/// Observes completed calls.
///
/// For each call that reached the network, exactly one method fires: the
/// raw response on success, or the classified error on failure. Calls that
/// fail before any network attempt (e.g. a missing key) are not reported.
pub trait ResponseListener: Send + Sync {
    fn on_response(&self, response: &ApiResponse);

    fn on_error(&self, error: &ApiError);
}
