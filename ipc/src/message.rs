//! Request and response structure

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Status codes used by the embedding protocol
pub mod status {
    /// Read succeeded
    pub const OK: u16 = 200;
    /// Mutation accepted and applied
    pub const ACCEPTED: u16 = 202;
    /// Validation failed, nothing was mutated
    pub const BAD_REQUEST: u16 = 400;
    /// No route for the path
    pub const NOT_FOUND: u16 = 404;
    /// Failure while applying a validated change
    pub const INTERNAL_SERVER_ERROR: u16 = 500;

    /// Checks if a status code is in the 2xx range
    pub fn is_success(code: u16) -> bool {
        (200..300).contains(&code)
    }
}

/// Unique identifier for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg({})", self.0)
    }
}

/// Request verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressing token correlating a request with one embedded instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addressing {
    pub uid: String,
}

impl Addressing {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

/// An HTTP-shaped request travelling between windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier for this message
    pub id: MessageId,
    /// Verb
    pub method: Method,
    /// Path, e.g. `/report/filters`
    pub url: String,
    /// JSON body (`null` when absent)
    #[serde(default)]
    pub body: Value,
    /// Instance addressing; omitted for requests not bound to an instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addressing: Option<Addressing>,
}

impl Request {
    /// Creates a new request with an empty body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            method,
            url: url.into(),
            body: Value::Null,
            addressing: None,
        }
    }

    /// Sets the body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Sets the addressing token
    pub fn with_addressing(mut self, addressing: Addressing) -> Self {
        self.addressing = Some(addressing);
        self
    }

    /// Returns the addressed uid, if any
    pub fn uid(&self) -> Option<&str> {
        self.addressing.as_ref().map(|a| a.uid.as_str())
    }
}

/// Reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    #[serde(default)]
    pub body: Value,
}

impl Response {
    /// Creates a response with a body
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    /// Creates a response without a body
    pub fn empty(status_code: u16) -> Self {
        Self::new(status_code, Value::Null)
    }

    /// Checks if the status code is 2xx
    pub fn is_success(&self) -> bool {
        status::is_success(self.status_code)
    }
}
