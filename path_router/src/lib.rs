//! # Path Router
//!
//! This crate routes inbound requests to handlers by verb and path pattern.
//!
//! ## Philosophy
//!
//! Unlike a flat table of action names, routes are:
//! - Patterns with `:named` segments, extracted into [`RouteParams`]
//! - Matched in registration order, first match wins
//! - Answered exactly once through a [`Responder`]
//!
//! A [`Router`] is itself an [`ipc::MessageHandler`], so it plugs directly
//! into a transport.

use ipc::{status, Addressing, MessageHandler, Method, Request, Response};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A path pattern such as `/reports/:uniqueId/events/:eventName`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a pattern; a segment starting with `:` captures one path segment
    pub fn new(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches a concrete path, returning the captured parameters
    ///
    /// Any query string is ignored. Captured segments are never empty.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let path = path.split('?').next().unwrap_or_default();
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.0.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Named parameters captured from a path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A matched request as seen by a route handler
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub url: String,
    pub params: RouteParams,
    pub body: Value,
    pub addressing: Option<Addressing>,
}

impl RouteRequest {
    /// Returns a captured parameter, or an empty string if the pattern has none by that name
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).unwrap_or_default()
    }

    pub fn uid(&self) -> Option<&str> {
        self.addressing.as_ref().map(|a| a.uid.as_str())
    }
}

/// Collects the single reply a handler gives
#[derive(Debug, Default)]
pub struct Responder {
    response: Option<Response>,
}

impl Responder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends the reply; only the first call counts
    pub fn send(&mut self, status_code: u16, body: Value) {
        if let Some(existing) = &self.response {
            tracing::warn!(
                first = existing.status_code,
                ignored = status_code,
                "responder already used"
            );
            return;
        }
        self.response = Some(Response::new(status_code, body));
    }

    /// Sends a reply without a body
    pub fn send_status(&mut self, status_code: u16) {
        self.send(status_code, Value::Null);
    }

    pub fn has_responded(&self) -> bool {
        self.response.is_some()
    }

    pub fn into_response(self) -> Option<Response> {
        self.response
    }
}

/// Handler invoked for a matched route
pub type RouteHandler = Rc<dyn Fn(&RouteRequest, &mut Responder)>;

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: RouteHandler,
}

/// Routes requests to handlers by verb and path pattern
///
/// Handlers may register further routes while running; the route table is
/// not borrowed during the call.
#[derive(Default)]
pub struct Router {
    routes: RefCell<Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a verb and pattern
    pub fn register<F>(&self, method: Method, pattern: &str, handler: F)
    where
        F: Fn(&RouteRequest, &mut Responder) + 'static,
    {
        self.routes.borrow_mut().push(Route {
            method,
            pattern: PathPattern::new(pattern),
            handler: Rc::new(handler),
        });
    }

    pub fn get<F>(&self, pattern: &str, handler: F)
    where
        F: Fn(&RouteRequest, &mut Responder) + 'static,
    {
        self.register(Method::Get, pattern, handler);
    }

    pub fn post<F>(&self, pattern: &str, handler: F)
    where
        F: Fn(&RouteRequest, &mut Responder) + 'static,
    {
        self.register(Method::Post, pattern, handler);
    }

    pub fn put<F>(&self, pattern: &str, handler: F)
    where
        F: Fn(&RouteRequest, &mut Responder) + 'static,
    {
        self.register(Method::Put, pattern, handler);
    }

    pub fn patch<F>(&self, pattern: &str, handler: F)
    where
        F: Fn(&RouteRequest, &mut Responder) + 'static,
    {
        self.register(Method::Patch, pattern, handler);
    }

    pub fn delete<F>(&self, pattern: &str, handler: F)
    where
        F: Fn(&RouteRequest, &mut Responder) + 'static,
    {
        self.register(Method::Delete, pattern, handler);
    }

    pub fn route_count(&self) -> usize {
        self.routes.borrow().len()
    }

    fn find(&self, request: &Request) -> Option<(RouteHandler, RouteParams)> {
        self.routes
            .borrow()
            .iter()
            .filter(|route| route.method == request.method)
            .find_map(|route| {
                route
                    .pattern
                    .matches(&request.url)
                    .map(|params| (Rc::clone(&route.handler), params))
            })
    }

    /// Routes a request and returns the handler's reply
    ///
    /// Unmatched requests get 404; a handler that never responds yields 500.
    pub fn dispatch(&self, request: &Request) -> Response {
        let Some((handler, params)) = self.find(request) else {
            tracing::debug!(method = %request.method, url = %request.url, "no route");
            return Response::empty(status::NOT_FOUND);
        };

        tracing::debug!(method = %request.method, url = %request.url, "route matched");
        let route_request = RouteRequest {
            method: request.method,
            url: request.url.clone(),
            params,
            body: request.body.clone(),
            addressing: request.addressing.clone(),
        };
        let mut responder = Responder::new();
        handler(&route_request, &mut responder);

        responder.into_response().unwrap_or_else(|| {
            tracing::warn!(url = %request.url, "handler did not respond");
            Response::empty(status::INTERNAL_SERVER_ERROR)
        })
    }
}

impl MessageHandler for Router {
    fn test(&self, _request: &Request) -> bool {
        true
    }

    fn handle(&self, request: &Request) -> Response {
        self.dispatch(request)
    }
}
