//! # Inter-Window Communication (IPC)
//!
//! This crate defines the message vocabulary shared by the host window and
//! the embedded content window.
//!
//! ## Philosophy
//!
//! - **Requests, not callbacks**: Every interaction is an HTTP-shaped request
//!   (verb + path + body) answered by a status code and a body
//! - **Addressed**: Requests bound to one embedded instance carry its `{uid}`
//! - **Traceable**: Every request has a message ID for debugging
//! - **Seams are traits**: The transport, the request/response layer and the
//!   handlers plugged into a transport are collaborators behind traits
//!
//! ## Architecture
//!
//! - [`RequestChannel`]: sends a request, resolves on 2xx, rejects otherwise
//! - [`Transport`]: carries messages between windows; handlers attach to it
//! - [`MessageHandler`]: answers inbound requests (the router is one)

pub mod channel;
pub mod message;
pub mod typed;

pub use channel::{ChannelFailure, MessageHandler, RequestChannel, Transport};
pub use message::{status, Addressing, MessageId, Method, Request, Response};
pub use typed::{Filter, LoadConfiguration, PageDescriptor, SettingsPatch, VisualDescriptor};
