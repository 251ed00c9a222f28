//! Outcome errors of instance operations

use ipc::{status, ChannelFailure};
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by instance, page and visual operations
///
/// Remote rejections keep the body exactly as the content sent it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbedError {
    #[error("event '{name}' is not supported by this instance")]
    UnsupportedEvent { name: String },

    #[error("content rejected the request during validation")]
    RemoteValidation { body: Value },

    #[error("content failed the request with status {status_code}")]
    RemoteOperation { status_code: u16, body: Value },

    #[error("request could not be delivered: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),
}

impl EmbedError {
    /// Body sent by the content, unchanged
    pub fn body(&self) -> Option<&Value> {
        match self {
            EmbedError::RemoteValidation { body } | EmbedError::RemoteOperation { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }

    /// Status code of a remote rejection
    pub fn status_code(&self) -> Option<u16> {
        match self {
            EmbedError::RemoteValidation { .. } => Some(status::BAD_REQUEST),
            EmbedError::RemoteOperation { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<ChannelFailure> for EmbedError {
    fn from(failure: ChannelFailure) -> Self {
        match failure {
            ChannelFailure::Rejected(response) if response.status_code == status::BAD_REQUEST => {
                EmbedError::RemoteValidation {
                    body: response.body,
                }
            }
            ChannelFailure::Rejected(response) => EmbedError::RemoteOperation {
                status_code: response.status_code,
                body: response.body,
            },
            ChannelFailure::Undeliverable(reason) => EmbedError::Transport(reason),
        }
    }
}
