//! # Simulated Content Host
//!
//! This crate plays the content window: it answers the embedding protocol
//! the way hosted reports and dashboards do, so the host side can be
//! exercised end to end without a browser.
//!
//! ## Philosophy
//!
//! - **Validate, then apply**: every mutation is validated first; a failed
//!   validation answers 400 and changes nothing
//! - **Events after the fact**: accepted changes queue the matching event
//!   (`initiator: "sdk"`), delivered to the host by [`SimulatedContent::flush_events`]
//! - **Observable**: every validate and apply step is recorded
//!
//! ## Example
//!
//! ```ignore
//! let content = SimulatedContent::new(Rc::new(pair.content_to_host()));
//! content.install(&*pair.content);
//! // ... host issues operations ...
//! content.flush_events().await;
//! ```

pub mod document;
pub mod validation;

pub use document::{default_catalog, ContentDocument, FilterScope, PageTemplate};

use core_types::EmbedType;
use ipc::{status, LoadConfiguration, Method, Request, RequestChannel, SettingsPatch, Transport};
use path_router::{Responder, RouteRequest, Router};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use validation::Violations;

const SDK: &str = "sdk";
const USER: &str = "user";

/// Step of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    Apply,
}

/// One recorded step of a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub operation: &'static str,
    pub phase: Phase,
    pub uid: String,
}

/// Node an event is raised on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    Instance,
    Page(String),
    Visual(String, String),
}

impl From<&FilterScope> for EventTarget {
    fn from(scope: &FilterScope) -> Self {
        match scope {
            FilterScope::Report => EventTarget::Instance,
            FilterScope::Page(page) => EventTarget::Page(page.clone()),
            FilterScope::Visual(page, visual) => EventTarget::Visual(page.clone(), visual.clone()),
        }
    }
}

struct SimInner {
    host: Rc<dyn RequestChannel>,
    router: Rc<Router>,
    catalog: RefCell<Vec<PageTemplate>>,
    documents: RefCell<HashMap<String, ContentDocument>>,
    calls: RefCell<Vec<CallRecord>>,
    outbox: RefCell<VecDeque<Request>>,
    fail_next_apply: Cell<bool>,
}

/// The simulated content window
#[derive(Clone)]
pub struct SimulatedContent {
    inner: Rc<SimInner>,
}

impl SimulatedContent {
    /// Creates the content window; events go to the host through `host`
    pub fn new(host: Rc<dyn RequestChannel>) -> Self {
        let inner = Rc::new(SimInner {
            host,
            router: Rc::new(Router::new()),
            catalog: RefCell::new(default_catalog()),
            documents: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            outbox: RefCell::new(VecDeque::new()),
            fail_next_apply: Cell::new(false),
        });
        register_routes(&inner);
        Self { inner }
    }

    /// Replaces the pages offered to reports loaded from now on
    pub fn with_catalog(self, pages: Vec<PageTemplate>) -> Self {
        *self.inner.catalog.borrow_mut() = pages;
        self
    }

    /// Router answering the protocol
    pub fn router(&self) -> Rc<Router> {
        Rc::clone(&self.inner.router)
    }

    /// Attaches the router to the content window's transport
    pub fn install(&self, transport: &dyn Transport) {
        transport.add_handler(self.router());
    }

    /// Makes the next mutation fail after passing validation
    pub fn fail_next_apply(&self) {
        self.inner.fail_next_apply.set(true);
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.inner.calls.borrow().clone()
    }

    pub fn call_count(&self, operation: &str, phase: Phase) -> usize {
        self.inner
            .calls
            .borrow()
            .iter()
            .filter(|call| call.operation == operation && call.phase == phase)
            .count()
    }

    /// Content loaded for `uid`
    pub fn document(&self, uid: &str) -> Option<ContentDocument> {
        self.inner.documents.borrow().get(uid).cloned()
    }

    pub fn pending_events(&self) -> usize {
        self.inner.outbox.borrow().len()
    }

    /// Sends queued events to the host in order; returns how many were accepted
    pub async fn flush_events(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.inner.outbox.borrow_mut().pop_front();
            let Some(request) = next else {
                break;
            };
            match self.inner.host.send(request.clone()).await {
                Ok(_) => delivered += 1,
                Err(err) => {
                    tracing::warn!(url = %request.url, error = %err, "event not accepted by host")
                }
            }
        }
        delivered
    }

    /// Raises an event as if the content's own UI caused it
    ///
    /// Returns false when nothing is loaded for `uid`.
    pub fn raise_user_event(&self, uid: &str, target: EventTarget, name: &str, detail: Value) -> bool {
        let Some(kind) = self.inner.kind_of(uid) else {
            return false;
        };
        self.inner.queue_event(uid, kind, &target, name, detail, USER);
        true
    }

    /// User navigates to another page
    pub fn user_changes_page(&self, uid: &str, page_name: &str) -> bool {
        let descriptor = {
            let mut documents = self.inner.documents.borrow_mut();
            let Some(document) = documents.get_mut(uid) else {
                return false;
            };
            let Some(page) = document.page(page_name).map(PageTemplate::descriptor) else {
                return false;
            };
            document.active_page = Some(page.name.clone());
            page
        };
        self.raise_user_event(
            uid,
            EventTarget::Instance,
            "pageChanged",
            json!({ "newPage": descriptor }),
        )
    }

    /// User selects data points in a visual
    pub fn user_selects_data(&self, uid: &str, page: &str, visual: &str, data_points: Value) -> bool {
        self.raise_user_event(
            uid,
            EventTarget::Instance,
            "dataSelected",
            json!({ "page": page, "visual": visual, "dataPoints": data_points }),
        )
    }
}

impl SimInner {
    fn kind_of(&self, uid: &str) -> Option<EmbedType> {
        self.documents.borrow().get(uid).map(|document| document.kind)
    }

    fn record(&self, operation: &'static str, phase: Phase, uid: &str) {
        self.calls.borrow_mut().push(CallRecord {
            operation,
            phase,
            uid: uid.to_string(),
        });
    }

    fn with_document<R>(
        &self,
        uid: &str,
        f: impl FnOnce(&ContentDocument) -> Result<R, Violations>,
    ) -> Result<R, Violations> {
        match self.documents.borrow().get(uid) {
            Some(document) => f(document),
            None => Err(vec![format!("no content is loaded for '{uid}'")]),
        }
    }

    fn with_document_mut(&self, uid: &str, f: impl FnOnce(&mut ContentDocument)) {
        if let Some(document) = self.documents.borrow_mut().get_mut(uid) {
            f(document);
        }
    }

    fn queue_event(
        &self,
        uid: &str,
        kind: EmbedType,
        target: &EventTarget,
        name: &str,
        detail: Value,
        initiator: &str,
    ) {
        let collection = kind.event_collection();
        let url = match target {
            EventTarget::Instance => format!("/{collection}/{uid}/events/{name}"),
            EventTarget::Page(page) => format!("/{collection}/{uid}/pages/{page}/events/{name}"),
            EventTarget::Visual(page, visual) => {
                format!("/{collection}/{uid}/pages/{page}/visuals/{visual}/events/{name}")
            }
        };

        let mut body = match detail {
            Value::Object(fields) => fields,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut fields = serde_json::Map::new();
                fields.insert("value".to_string(), other);
                fields
            }
        };
        body.insert("initiator".to_string(), Value::from(initiator));

        tracing::debug!(url = %url, initiator, "event queued");
        self.outbox
            .borrow_mut()
            .push_back(Request::new(Method::Post, url).with_body(Value::Object(body)));
    }

    /// Answers a read with 200, or 400 when the request is invalid
    fn read(
        &self,
        request: &RouteRequest,
        responder: &mut Responder,
        f: impl FnOnce(&ContentDocument) -> Result<Value, Violations>,
    ) {
        let Some(uid) = request.uid() else {
            return reject(responder, vec![UNADDRESSED.to_string()]);
        };
        match self.with_document(uid, f) {
            Ok(body) => responder.send(status::OK, body),
            Err(violations) => reject(responder, violations),
        }
    }

    /// Runs the validate-then-apply protocol for one mutation
    fn mutate<T>(
        &self,
        request: &RouteRequest,
        responder: &mut Responder,
        kind: EmbedType,
        operation: &'static str,
        validate: impl FnOnce(&SimInner, &str) -> Result<T, Violations>,
        apply: impl FnOnce(&SimInner, &str, T),
    ) {
        let Some(uid) = request.uid() else {
            return reject(responder, vec![UNADDRESSED.to_string()]);
        };

        self.record(operation, Phase::Validate, uid);
        let value = match validate(self, uid) {
            Ok(value) => value,
            Err(violations) => {
                tracing::debug!(operation, uid, "validation failed");
                return reject(responder, violations);
            }
        };

        self.record(operation, Phase::Apply, uid);
        if self.fail_next_apply.replace(false) {
            let message = format!("{operation} could not be applied");
            self.queue_event(
                uid,
                kind,
                &EventTarget::Instance,
                "error",
                json!({ "message": message }),
                SDK,
            );
            return responder.send(
                status::INTERNAL_SERVER_ERROR,
                json!([{ "message": message }]),
            );
        }

        apply(self, uid, value);
        responder.send_status(status::ACCEPTED);
    }
}

const UNADDRESSED: &str = "request is not addressed to an instance";

fn reject(responder: &mut Responder, violations: Violations) {
    let body: Vec<Value> = violations
        .into_iter()
        .map(|message| json!({ "message": message }))
        .collect();
    responder.send(status::BAD_REQUEST, Value::Array(body));
}

fn route<F>(inner: &Rc<SimInner>, method: Method, pattern: &str, handler: F)
where
    F: Fn(&SimInner, &RouteRequest, &mut Responder) + 'static,
{
    let sim = Rc::downgrade(inner);
    inner
        .router
        .register(method, pattern, move |request, responder| match sim.upgrade() {
            Some(sim) => handler(&sim, request, responder),
            None => responder.send_status(status::INTERNAL_SERVER_ERROR),
        });
}

fn scope_of(request: &RouteRequest) -> FilterScope {
    match (request.params.get("pageName"), request.params.get("visualName")) {
        (Some(page), Some(visual)) => FilterScope::Visual(page.to_string(), visual.to_string()),
        (Some(page), None) => FilterScope::Page(page.to_string()),
        _ => FilterScope::Report,
    }
}

fn check_scope(document: &ContentDocument, scope: &FilterScope) -> Result<(), Violations> {
    match scope {
        FilterScope::Report => Ok(()),
        FilterScope::Page(page) if document.page(page).is_some() => Ok(()),
        FilterScope::Page(page) => Err(vec![format!("page '{page}' does not exist")]),
        FilterScope::Visual(page, visual) if document.has_visual(page, visual) => Ok(()),
        FilterScope::Visual(page, visual) => Err(vec![format!(
            "visual '{visual}' does not exist on page '{page}'"
        )]),
    }
}

fn register_routes(inner: &Rc<SimInner>) {
    for kind in EmbedType::ALL {
        route(
            inner,
            Method::Post,
            &format!("{}/load", kind.route_base()),
            move |sim, request, responder| {
                sim.mutate(
                    request,
                    responder,
                    kind,
                    "load",
                    |_, _| validation::validate_load(&request.body),
                    |sim, uid, load: LoadConfiguration| {
                        let mut document =
                            ContentDocument::new(kind, load.id.clone(), sim.catalog.borrow().clone());
                        if let Some(settings) = &load.settings {
                            document.apply_settings(settings);
                        }
                        sim.documents.borrow_mut().insert(uid.to_string(), document);
                        sim.queue_event(uid, kind, &EventTarget::Instance, "loaded", json!({}), SDK);
                    },
                )
            },
        );
    }

    route(inner, Method::Get, "/report/pages", |sim, request, responder| {
        sim.read(request, responder, |document| {
            let pages: Vec<_> = document.pages.iter().map(PageTemplate::descriptor).collect();
            Ok(json!(pages))
        })
    });

    route(inner, Method::Put, "/report/pages/active", |sim, request, responder| {
        sim.mutate(
            request,
            responder,
            EmbedType::Report,
            "setPage",
            |sim, uid| {
                sim.with_document(uid, |document| {
                    validation::validate_page(&request.body, &document.page_names())
                })
            },
            |sim, uid, page_name: String| {
                let mut descriptor = None;
                sim.with_document_mut(uid, |document| {
                    descriptor = document.page(&page_name).map(PageTemplate::descriptor);
                    document.active_page = Some(page_name.clone());
                });
                sim.queue_event(
                    uid,
                    EmbedType::Report,
                    &EventTarget::Instance,
                    "pageChanged",
                    json!({ "newPage": descriptor }),
                    SDK,
                );
            },
        )
    });

    route(
        inner,
        Method::Get,
        "/report/pages/:pageName/visuals",
        |sim, request, responder| {
            sim.read(request, responder, |document| {
                let page = request.param("pageName");
                document
                    .visuals(page)
                    .map(|visuals| json!(visuals))
                    .ok_or_else(|| vec![format!("page '{page}' does not exist")])
            })
        },
    );

    for pattern in [
        "/report/filters",
        "/report/pages/:pageName/filters",
        "/report/pages/:pageName/visuals/:visualName/filters",
    ] {
        route(inner, Method::Get, pattern, |sim, request, responder| {
            sim.read(request, responder, |document| {
                let scope = scope_of(request);
                check_scope(document, &scope)?;
                Ok(json!(document.filters(&scope)))
            })
        });

        route(inner, Method::Put, pattern, |sim, request, responder| {
            sim.mutate(
                request,
                responder,
                EmbedType::Report,
                "setFilters",
                |sim, uid| {
                    let scope = scope_of(request);
                    sim.with_document(uid, |document| check_scope(document, &scope))?;
                    let filters = validation::validate_filters(&request.body)?;
                    Ok((scope, filters))
                },
                |sim, uid, (scope, filters): (FilterScope, Vec<Value>)| {
                    sim.with_document_mut(uid, |document| {
                        document.filters.insert(scope.clone(), filters.clone());
                    });
                    sim.queue_event(
                        uid,
                        EmbedType::Report,
                        &EventTarget::from(&scope),
                        "filtersApplied",
                        json!({ "filters": filters }),
                        SDK,
                    );
                },
            )
        });
    }

    route(inner, Method::Patch, "/report/settings", |sim, request, responder| {
        sim.mutate(
            request,
            responder,
            EmbedType::Report,
            "updateSettings",
            |sim, uid| {
                sim.with_document(uid, |_| Ok(()))?;
                validation::validate_settings(&request.body)
            },
            |sim, uid, patch: SettingsPatch| {
                sim.with_document_mut(uid, |document| document.apply_settings(&patch));
                sim.queue_event(
                    uid,
                    EmbedType::Report,
                    &EventTarget::Instance,
                    "settingsUpdated",
                    json!({ "settings": patch }),
                    SDK,
                );
            },
        )
    });

    for (operation, path) in [("print", "/report/print"), ("refresh", "/report/refresh")] {
        route(inner, Method::Post, path, move |sim, request, responder| {
            sim.mutate(
                request,
                responder,
                EmbedType::Report,
                operation,
                |sim, uid| sim.with_document(uid, |_| Ok(())),
                |_, _, ()| {},
            )
        });
    }
}
