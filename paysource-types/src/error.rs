//! Error taxonomy for payment API calls.
//!
//! Every call terminates in either a parsed domain object or exactly one of
//! these kinds. None of them is retried.

use crate::ports::ApiResponse;

/// Classified outcome of a failed API call.
///
/// The `Display` form is the server-provided message, unchanged, so it can
/// be shown to the person entering payment details.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Missing, empty or secret credential, or an HTTP 401 response.
    #[error("{message}")]
    Authentication {
        message: String,
        status: Option<u16>,
        request_id: Option<String>,
    },

    /// HTTP 402: the card was declined or one of its fields is invalid.
    #[error("{message}")]
    Card {
        message: String,
        code: Option<String>,
        param: Option<String>,
        decline_code: Option<String>,
        request_id: Option<String>,
    },

    /// HTTP 400/404/429: malformed parameters not specific to a card.
    #[error("{message}")]
    InvalidRequest {
        message: String,
        param: Option<String>,
        status: u16,
        request_id: Option<String>,
    },

    /// Transport failure before any HTTP response was obtained.
    #[error("{message}")]
    ApiConnection { message: String },

    /// Any other non-2xx response, or a body that fails schema validation.
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
        request_id: Option<String>,
    },
}

impl ApiError {
    /// Creates an authentication error raised locally, before any network I/O.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            status: None,
            request_id: None,
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ApiConnection {
            message: message.into(),
        }
    }

    /// Creates a generic API error for a body that could not be interpreted.
    pub fn malformed(response: &ApiResponse, message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status: Some(response.status),
            request_id: response.request_id.clone(),
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Authentication { message, .. }
            | Self::Card { message, .. }
            | Self::InvalidRequest { message, .. }
            | Self::ApiConnection { message }
            | Self::Api { message, .. } => message,
        }
    }

    /// HTTP status that produced this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Api { status, .. } => *status,
            Self::Card { .. } => Some(402),
            Self::InvalidRequest { status, .. } => Some(*status),
            Self::ApiConnection { .. } => None,
        }
    }

    /// Server request id, when the response carried one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Authentication { request_id, .. }
            | Self::Card { request_id, .. }
            | Self::InvalidRequest { request_id, .. }
            | Self::Api { request_id, .. } => request_id.as_deref(),
            Self::ApiConnection { .. } => None,
        }
    }

    /// Short name of the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication_error",
            Self::Card { .. } => "card_error",
            Self::InvalidRequest { .. } => "invalid_request_error",
            Self::ApiConnection { .. } => "api_connection_error",
            Self::Api { .. } => "api_error",
        }
    }
}
