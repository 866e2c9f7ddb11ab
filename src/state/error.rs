//! Errors raised while talking to the accounting API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, TLS, timeout at the socket).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API rejected the credential (or none was attached).
    #[error("not authenticated")]
    Unauthenticated,

    /// The response body did not match the expected shape.
    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    /// A request was attempted before the session finished restoring.
    #[error("session is still being restored")]
    NotReady,
}

impl ApiError {
    /// Text suitable for an alert shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Api { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Api { status, .. } => format!("Request failed with status {status}"),
            ApiError::Unauthenticated => "Your session is not valid. Please log in again.".into(),
            ApiError::Http(_) => "Could not reach the server.".into(),
            ApiError::Decode { .. } => "The server sent an unexpected response.".into(),
            ApiError::NotReady => "Still loading your session, try again.".into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Unauthenticated => Some(401),
            _ => None,
        }
    }
}
