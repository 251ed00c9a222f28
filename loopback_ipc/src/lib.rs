//! In-process window messaging.
//!
//! [`LoopbackTransport`] stands in for one window's message listener and
//! [`PostMessageChannel`] for the request/response layer that posts to it.
//! Delivery is synchronous and in send order.

use async_trait::async_trait;
use ipc::{ChannelFailure, MessageHandler, Request, RequestChannel, Response, Transport};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport '{0}' is stopped")]
    Stopped(String),

    #[error("no listener on '{0}' accepted the message")]
    NoListener(String),
}

/// Message listener of one window
pub struct LoopbackTransport {
    name: String,
    log_messages: bool,
    handlers: RefCell<Vec<Rc<dyn MessageHandler>>>,
    stopped: Cell<bool>,
}

impl LoopbackTransport {
    pub fn new(name: impl Into<String>, log_messages: bool) -> Self {
        Self {
            name: name.into(),
            log_messages,
            handlers: RefCell::new(Vec::new()),
            stopped: Cell::new(false),
        }
    }

    /// Delivers a request to the first handler that accepts it
    pub fn deliver(&self, request: &Request) -> Result<Response, DeliveryError> {
        if self.stopped.get() {
            return Err(DeliveryError::Stopped(self.name.clone()));
        }

        if self.log_messages {
            tracing::debug!(
                channel = %self.name,
                id = %request.id,
                method = %request.method,
                url = %request.url,
                "message received"
            );
        }

        // Handlers may send further messages while handling this one.
        let handlers: Vec<Rc<dyn MessageHandler>> = self.handlers.borrow().clone();
        let handler = handlers
            .into_iter()
            .find(|handler| handler.test(request))
            .ok_or_else(|| DeliveryError::NoListener(self.name.clone()))?;

        let response = handler.handle(request);
        if self.log_messages {
            tracing::debug!(
                channel = %self.name,
                id = %request.id,
                status = response.status_code,
                "message answered"
            );
        }
        Ok(response)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl Transport for LoopbackTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_handler(&self, handler: Rc<dyn MessageHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    fn stop(&self) {
        if self.stopped.replace(true) {
            tracing::warn!(channel = %self.name, "transport stopped twice");
            return;
        }
        self.handlers.borrow_mut().clear();
        tracing::debug!(channel = %self.name, "transport stopped");
    }

    fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Request/response channel posting into a target window
#[derive(Clone)]
pub struct PostMessageChannel {
    target: Rc<LoopbackTransport>,
}

impl PostMessageChannel {
    pub fn new(target: Rc<LoopbackTransport>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Rc<LoopbackTransport> {
        &self.target
    }
}

#[async_trait(?Send)]
impl RequestChannel for PostMessageChannel {
    async fn send(&self, request: Request) -> Result<Response, ChannelFailure> {
        let response = self
            .target
            .deliver(&request)
            .map_err(|err| ChannelFailure::Undeliverable(err.to_string()))?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(ChannelFailure::Rejected(response))
        }
    }
}

/// Host window and embedded content window wired to each other
pub struct WindowPair {
    /// Listener of the host window (events arrive here)
    pub host: Rc<LoopbackTransport>,
    /// Listener of the content window (operations arrive here)
    pub content: Rc<LoopbackTransport>,
}

impl WindowPair {
    pub fn new(host_name: &str, content_name: &str, log_messages: bool) -> Self {
        Self {
            host: Rc::new(LoopbackTransport::new(host_name, log_messages)),
            content: Rc::new(LoopbackTransport::new(content_name, log_messages)),
        }
    }

    /// Channel the host uses to reach the content
    pub fn host_to_content(&self) -> PostMessageChannel {
        PostMessageChannel::new(Rc::clone(&self.content))
    }

    /// Channel the content uses to reach the host
    pub fn content_to_host(&self) -> PostMessageChannel {
        PostMessageChannel::new(Rc::clone(&self.host))
    }
}
