//! Collaborator seams: request/response channel, transport, handlers

use crate::message::{Addressing, Method, Request, Response};
use async_trait::async_trait;
use serde_json::Value;
use std::rc::Rc;
use thiserror::Error;

/// Why a request did not resolve
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChannelFailure {
    /// The remote side answered with a non-2xx status
    #[error("request rejected with status {}", .0.status_code)]
    Rejected(Response),

    /// The message could not be delivered; there is no status code
    #[error("request could not be delivered: {0}")]
    Undeliverable(String),
}

impl ChannelFailure {
    /// Status code of a rejection, `None` for delivery failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ChannelFailure::Rejected(response) => Some(response.status_code),
            ChannelFailure::Undeliverable(_) => None,
        }
    }
}

/// Request/response layer built on top of a transport
///
/// A 2xx reply resolves with the response; anything else rejects with
/// [`ChannelFailure::Rejected`] carrying the full response.
#[async_trait(?Send)]
pub trait RequestChannel {
    async fn send(&self, request: Request) -> Result<Response, ChannelFailure>;

    async fn get(
        &self,
        url: &str,
        addressing: Option<Addressing>,
    ) -> Result<Response, ChannelFailure> {
        self.send(build(Method::Get, url, Value::Null, addressing))
            .await
    }

    async fn post(
        &self,
        url: &str,
        body: Value,
        addressing: Option<Addressing>,
    ) -> Result<Response, ChannelFailure> {
        self.send(build(Method::Post, url, body, addressing)).await
    }

    async fn put(
        &self,
        url: &str,
        body: Value,
        addressing: Option<Addressing>,
    ) -> Result<Response, ChannelFailure> {
        self.send(build(Method::Put, url, body, addressing)).await
    }

    async fn patch(
        &self,
        url: &str,
        body: Value,
        addressing: Option<Addressing>,
    ) -> Result<Response, ChannelFailure> {
        self.send(build(Method::Patch, url, body, addressing)).await
    }

    async fn delete(
        &self,
        url: &str,
        addressing: Option<Addressing>,
    ) -> Result<Response, ChannelFailure> {
        self.send(build(Method::Delete, url, Value::Null, addressing))
            .await
    }
}

fn build(method: Method, url: &str, body: Value, addressing: Option<Addressing>) -> Request {
    let request = Request::new(method, url).with_body(body);
    match addressing {
        Some(addressing) => request.with_addressing(addressing),
        None => request,
    }
}

/// Answers inbound requests delivered by a transport
pub trait MessageHandler {
    /// Checks if this handler wants the request
    fn test(&self, request: &Request) -> bool;

    /// Handles the request; called only when `test` returned true
    fn handle(&self, request: &Request) -> Response;
}

/// Raw cross-window transport
///
/// Handler registration is used by the router only. `stop` tears down all
/// listeners; the owner calls it exactly once.
pub trait Transport {
    /// Diagnostic channel label
    fn name(&self) -> &str;

    /// Attaches a handler for inbound messages
    fn add_handler(&self, handler: Rc<dyn MessageHandler>);

    /// Tears down all listeners
    fn stop(&self);

    /// Checks if `stop` has been called
    fn is_stopped(&self) -> bool;
}
