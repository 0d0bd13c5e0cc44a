//! Awaitable handle for a call spawned onto an executor.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use paysource_types::ApiError;

/// Resolves to the result of a spawned call.
///
/// Dropping the handle does not cancel the call; the listener is still
/// notified when it completes.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, ApiError>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<T, ApiError>>) -> Self {
        Self { rx }
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(ApiError::Api {
                    message: "Call ended without delivering a result".into(),
                    status: None,
                    request_id: None,
                })
            })
        })
    }
}
