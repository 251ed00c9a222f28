//! # Embedding Contract Tests
//!
//! This crate provides "golden" tests for the messages exchanged between
//! the host and the content window, so the wire contract does not drift
//! accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: verbs, paths and payload keys are written out literally
//! - **Testability first**: contract tests fail when a message shape changes
//!
//! ## Structure
//!
//! - [`load`]: the load message of every content type
//! - [`report`]: operations on reports, pages and visuals
//! - [`events`]: event URLs the host accepts from the content window

pub mod events;
pub mod load;
pub mod report;

/// Common test helpers for contract validation
pub mod test_helpers {
    use async_trait::async_trait;
    use core_types::EmbedType;
    use embed_components::{constructor_for, EmbedParts, Instance, Report};
    use embed_config::{resolve, EmbedConfiguration};
    use host_dom::FakeElement;
    use ipc::{status, ChannelFailure, Method, Request, RequestChannel, Response};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Unique id every contract instance is created with
    pub const UID: &str = "contract-uid";

    /// Channel that records every request and answers from a script
    ///
    /// Unscripted requests are answered with 202 and no body.
    #[derive(Default)]
    pub struct RecordingChannel {
        sent: RefCell<Vec<Request>>,
        replies: RefCell<VecDeque<Response>>,
    }

    impl RecordingChannel {
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        pub fn reply_with(&self, response: Response) {
            self.replies.borrow_mut().push_back(response);
        }

        pub fn sent(&self) -> Vec<Request> {
            self.sent.borrow().clone()
        }

        /// The only request sent so far
        pub fn single(&self) -> Request {
            let sent = self.sent.borrow();
            assert_eq!(sent.len(), 1, "expected exactly one request, got {:?}", *sent);
            sent[0].clone()
        }
    }

    #[async_trait(?Send)]
    impl RequestChannel for RecordingChannel {
        async fn send(&self, request: Request) -> Result<Response, ChannelFailure> {
            self.sent.borrow_mut().push(request);
            let response = self
                .replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Response::empty(status::ACCEPTED));
            if response.is_success() {
                Ok(response)
            } else {
                Err(ChannelFailure::Rejected(response))
            }
        }
    }

    /// Builds an instance of `embed_type` talking through `channel`
    pub fn instance_with(embed_type: EmbedType, channel: &Rc<RecordingChannel>) -> Instance {
        let config = EmbedConfiguration::new()
            .with_embed_url("https://app.example/embed")
            .with_id("content-1")
            .with_access_token("token-1")
            .with_unique_id(UID);
        let element = FakeElement::new("div").shared();
        let resolved = resolve(&config, &*element, embed_type, None)
            .expect("contract configuration resolves");
        constructor_for(embed_type)(EmbedParts {
            config: resolved,
            element,
            channel: Rc::clone(channel) as Rc<dyn RequestChannel>,
        })
    }

    pub fn report_with(channel: &Rc<RecordingChannel>) -> Report {
        instance_with(EmbedType::Report, channel)
            .as_report()
            .cloned()
            .expect("report constructor builds a report")
    }

    /// Verifies verb, path and addressing of a request
    pub fn verify_request_contract(request: &Request, method: Method, url: &str) {
        assert_eq!(
            request.method, method,
            "Verb changed for {}: expected {:?}, got {:?}",
            url, method, request.method
        );
        assert_eq!(
            request.url, url,
            "Path changed: expected '{}', got '{}'",
            url, request.url
        );
        assert_eq!(
            request.uid(),
            Some(UID),
            "Request to {} is not addressed to its instance",
            url
        );
    }
}
