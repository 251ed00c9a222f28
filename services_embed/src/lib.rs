//! # Embed Service
//!
//! This crate implements the instance registry: which host element owns
//! which embedded instance, and how events from the content window reach
//! that instance's subscribers.
//!
//! ## Philosophy
//!
//! - **One instance per element**: embedding over a live instance either
//!   reuses it (same content type) or tears it down first
//! - **Explicit lifecycle**: the shared transport, router and default access
//!   token belong to a [`Service`] value and end with [`Service::stop`]
//! - **Tagged constructors**: content types map to constructor functions in
//!   a table, looked up by tag
//!
//! ## Example
//!
//! ```ignore
//! let service = Service::new(ServiceConfig::default(), transport, channel, spawner);
//! let instance = service.embed(&element, &EmbedConfiguration::new().with_type("report"))?;
//! instance.embed().on("loaded", |event| println!("{}", event.name))?;
//! ```

mod dispatch;
pub mod registry;

pub use registry::InstanceTable;

use core_types::{ElementId, EmbedType, UniqueId};
use embed_components::{constructor_for, Constructor, EmbedParts, Instance};
use embed_config::{resolve, resolve_type_name, ConfigurationError, EmbedConfiguration};
use futures::task::{LocalSpawn, LocalSpawnExt};
use host_dom::{descendants, ElementRef, HostElement};
use ipc::{LoadConfiguration, RequestChannel, Transport};
use path_router::Router;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Attribute marking an element for [`Service::init`]
pub const EMBED_MARKER: &str = embed_config::attributes::EMBED_URL;

/// Service errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("unknown embed type '{0}'")]
    UnknownType(String),

    #[error("no instance is embedded in {0}")]
    NotEmbedded(ElementId),

    #[error("unique id '{0}' is already used by another instance")]
    DuplicateUniqueId(UniqueId),

    #[error("service is stopped")]
    Stopped,
}

/// Service-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// Transport channel label, diagnostic only
    pub wpmp_name: Option<String>,
    /// Reported at startup, diagnostic only; message tracing is switched on
    /// where the transport is built
    pub log_messages: bool,
    /// Default access token for instances that supply none
    pub access_token: Option<String>,
}

pub(crate) struct ServiceInner {
    transport: Rc<dyn Transport>,
    channel: Rc<dyn RequestChannel>,
    router: Rc<Router>,
    spawner: Rc<dyn LocalSpawn>,
    components: HashMap<EmbedType, Constructor>,
    instances: RefCell<InstanceTable>,
    access_token: RefCell<Option<String>>,
    document: RefCell<Option<ElementRef>>,
    stopped: Cell<bool>,
}

impl ServiceInner {
    pub(crate) fn find_instance(&self, unique_id: &str) -> Option<Instance> {
        self.instances.borrow().find(unique_id).cloned()
    }
}

/// Registry of embedded instances
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct Service {
    inner: Rc<ServiceInner>,
}

impl Service {
    /// Creates a registry over a transport (inbound events) and a channel
    /// (outbound operations)
    ///
    /// Loads that are not awaited by the caller run on `spawner`.
    pub fn new(
        config: ServiceConfig,
        transport: Rc<dyn Transport>,
        channel: Rc<dyn RequestChannel>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        let components = EmbedType::ALL
            .into_iter()
            .map(|embed_type| (embed_type, constructor_for(embed_type)))
            .collect();

        let inner = Rc::new(ServiceInner {
            transport,
            channel,
            router: Rc::new(Router::new()),
            spawner,
            components,
            instances: RefCell::new(InstanceTable::new()),
            access_token: RefCell::new(config.access_token.clone()),
            document: RefCell::new(None),
            stopped: Cell::new(false),
        });

        dispatch::register_event_routes(&inner.router, &inner);
        inner.transport.add_handler(inner.router.clone());

        tracing::info!(
            channel = config.wpmp_name.as_deref().unwrap_or(inner.transport.name()),
            log_messages = config.log_messages,
            "embed service started"
        );
        Self { inner }
    }

    /// Sets the root scanned by [`Service::init`] when no root is given
    pub fn set_document(&self, root: ElementRef) {
        *self.inner.document.borrow_mut() = Some(root);
    }

    /// Sets the default access token
    pub fn set_access_token(&self, token: impl Into<String>) {
        *self.inner.access_token.borrow_mut() = Some(token.into());
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.access_token.borrow().clone()
    }

    /// Embeds content in `element`, or reuses the instance already there
    pub fn embed(
        &self,
        element: &ElementRef,
        config: &EmbedConfiguration,
    ) -> Result<Instance, ServiceError> {
        if self.is_stopped() {
            return Err(ServiceError::Stopped);
        }

        let type_name = resolve_type_name(config, &**element)?;
        let embed_type: EmbedType = type_name
            .parse()
            .map_err(|_| ServiceError::UnknownType(type_name.clone()))?;
        let constructor = *self
            .inner
            .components
            .get(&embed_type)
            .ok_or(ServiceError::UnknownType(type_name))?;

        let default_token = self.access_token();
        let resolved = resolve(config, &**element, embed_type, default_token.as_deref())?;

        let existing = self.inner.instances.borrow().get(element.id()).cloned();
        let reused = existing
            .as_ref()
            .is_some_and(|existing| existing.embed_type() == embed_type);
        // The uid may stay with this element; any other owner is a conflict.
        let holder = self.inner.find_instance(resolved.unique_id.as_str());
        if !reused && holder.is_some_and(|holder| holder.embed().element_id() != element.id()) {
            return Err(ServiceError::DuplicateUniqueId(resolved.unique_id));
        }

        if let Some(existing) = existing {
            if existing.embed_type() == embed_type {
                tracing::info!(
                    unique_id = %existing.embed().unique_id(),
                    id = %resolved.id,
                    "reusing instance"
                );
                self.spawn_load(&existing, resolved.to_load_configuration());
                return Ok(existing);
            }

            tracing::info!(
                unique_id = %existing.embed().unique_id(),
                from = %existing.embed_type(),
                to = %embed_type,
                "content type changed; replacing instance"
            );
            self.reset(element);
        }


        let instance = constructor(EmbedParts {
            config: resolved,
            element: Rc::clone(element),
            channel: Rc::clone(&self.inner.channel),
        });
        self.inner.instances.borrow_mut().insert(instance.clone())?;

        let load = instance.embed().attach();
        tracing::info!(
            unique_id = %instance.embed().unique_id(),
            embed_type = %embed_type,
            "instance created"
        );
        self.spawn_load(&instance, load);
        Ok(instance)
    }

    /// Instance bound to `element`
    pub fn get(&self, element: &ElementRef) -> Result<Instance, ServiceError> {
        self.inner
            .instances
            .borrow()
            .get(element.id())
            .cloned()
            .ok_or(ServiceError::NotEmbedded(element.id()))
    }

    /// Instance with the given unique id, if live
    pub fn find(&self, unique_id: &str) -> Option<Instance> {
        self.inner.find_instance(unique_id)
    }

    /// Tears down the instance bound to `element`; no-op when there is none
    pub fn reset(&self, element: &ElementRef) {
        let removed = self.inner.instances.borrow_mut().remove(element.id());
        if let Some(instance) = removed {
            instance.embed().teardown();
            tracing::info!(unique_id = %instance.embed().unique_id(), "instance reset");
        }
    }

    /// Embeds every marked descendant of `root` (or of the document)
    ///
    /// Failures are logged per element and do not stop the scan.
    pub fn init(&self, root: Option<&ElementRef>) {
        let root = match root {
            Some(root) => Rc::clone(root),
            None => match self.inner.document.borrow().clone() {
                Some(document) => document,
                None => {
                    tracing::warn!("init called without a root and no document is set");
                    return;
                }
            },
        };

        let config = EmbedConfiguration::default();
        for element in descendants(&root)
            .into_iter()
            .filter(|element| element.attribute(EMBED_MARKER).is_some())
        {
            if let Err(err) = self.embed(&element, &config) {
                tracing::warn!(element = %element.id(), error = %err, "init could not embed element");
            }
        }
    }

    /// Live instances, in no particular order
    pub fn instances(&self) -> Vec<Instance> {
        self.inner.instances.borrow().instances()
    }

    /// Stops the shared transport; later embeds fail with [`ServiceError::Stopped`]
    pub fn stop(&self) {
        if self.inner.stopped.replace(true) {
            tracing::warn!("embed service already stopped");
            return;
        }
        self.inner.transport.stop();
        tracing::info!(instances = self.inner.instances.borrow().len(), "embed service stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    fn spawn_load(&self, instance: &Instance, load: LoadConfiguration) {
        let embed = instance.embed().clone();
        let spawned = self.inner.spawner.spawn_local(async move {
            if let Err(err) = embed.load(load).await {
                tracing::warn!(
                    unique_id = %embed.unique_id(),
                    error = %err,
                    "background load rejected"
                );
            }
        });
        if let Err(err) = spawned {
            tracing::warn!(error = %err, "could not schedule load");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed_components::EmbedState;
    use futures::executor::LocalPool;
    use host_dom::FakeElement;
    use ipc::{status, MessageHandler, Method, Request, Response};
    use loopback_ipc::WindowPair;
    use serde_json::json;
    use std::cell::RefCell;

    /// Content window that accepts everything and remembers what it saw
    #[derive(Default)]
    struct AcceptAll {
        seen: RefCell<Vec<Request>>,
    }

    impl MessageHandler for AcceptAll {
        fn test(&self, _request: &Request) -> bool {
            true
        }

        fn handle(&self, request: &Request) -> Response {
            self.seen.borrow_mut().push(request.clone());
            Response::empty(status::ACCEPTED)
        }
    }

    struct Harness {
        pool: LocalPool,
        pair: WindowPair,
        content: Rc<AcceptAll>,
        service: Service,
    }

    fn harness() -> Harness {
        let pool = LocalPool::new();
        let pair = WindowPair::new("host", "content", false);
        let content = Rc::new(AcceptAll::default());
        pair.content.add_handler(content.clone());
        let service = Service::new(
            ServiceConfig::default(),
            pair.host.clone(),
            Rc::new(pair.host_to_content()),
            Rc::new(pool.spawner()),
        );
        Harness {
            pool,
            pair,
            content,
            service,
        }
    }

    fn report_element(unique_id: &str) -> ElementRef {
        FakeElement::new("div")
            .with_attribute("powerbi-embed-url", "https://host/reportEmbed?reportId=R1")
            .with_attribute("powerbi-type", "report")
            .with_attribute("powerbi-access-token", "T")
            .with_attribute("powerbi-name", unique_id)
            .shared()
    }

    fn post_event(pair: &WindowPair, url: &str, body: serde_json::Value) -> u16 {
        pair.host
            .deliver(&Request::new(Method::Post, url).with_body(body))
            .map(|response| response.status_code)
            .unwrap()
    }

    #[test]
    fn test_embed_get_find_return_same_instance() {
        let mut h = harness();
        let element = report_element("r1");

        let instance = h.service.embed(&element, &EmbedConfiguration::new()).unwrap();
        assert!(h.service.get(&element).unwrap().ptr_eq(&instance));
        assert!(h.service.find("r1").unwrap().ptr_eq(&instance));
        assert_eq!(instance.embed().state(), EmbedState::Embedding);

        h.pool.run_until_stalled();
        assert_eq!(instance.embed().state(), EmbedState::Loaded);
        let seen = h.content.seen.borrow();
        assert_eq!(seen[0].url, "/report/load");
        assert_eq!(seen[0].body["id"], json!("R1"));
    }

    #[test]
    fn test_get_without_embed_fails() {
        let h = harness();
        let element = report_element("r1");
        assert_eq!(
            h.service.get(&element).unwrap_err(),
            ServiceError::NotEmbedded(element.id())
        );
    }

    #[test]
    fn test_reset_unbinds_and_clears() {
        let h = harness();
        let element = report_element("r1");
        let instance = h.service.embed(&element, &EmbedConfiguration::new()).unwrap();

        h.service.reset(&element);
        assert!(h.service.get(&element).is_err());
        assert!(h.service.find("r1").is_none());
        assert!(element.frame().is_none());
        assert_eq!(instance.embed().state(), EmbedState::Reset);

        h.service.reset(&element);
    }

    #[test]
    fn test_unknown_type() {
        let h = harness();
        let element = report_element("r1");
        let err = h
            .service
            .embed(&element, &EmbedConfiguration::new().with_type("unknownType"))
            .unwrap_err();
        assert_eq!(err, ServiceError::UnknownType("unknownType".to_string()));
    }

    #[test]
    fn test_missing_token_without_default() {
        let h = harness();
        let element: ElementRef = FakeElement::new("div")
            .with_attribute("powerbi-embed-url", "https://host/reportEmbed?reportId=R1")
            .shared();
        let config = EmbedConfiguration::new().with_type("report");

        let err = h.service.embed(&element, &config).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Configuration(ConfigurationError::MissingAccessToken { .. })
        ));

        h.service.set_access_token("global");
        let instance = h.service.embed(&element, &config).unwrap();
        assert_eq!(instance.embed().config().access_token, "global");
    }

    #[test]
    fn test_same_type_reuses_instance_and_loads() {
        let mut h = harness();
        let element = report_element("r1");
        let first = h.service.embed(&element, &EmbedConfiguration::new()).unwrap();
        h.pool.run_until_stalled();

        let second = h
            .service
            .embed(&element, &EmbedConfiguration::new().with_id("R2"))
            .unwrap();
        h.pool.run_until_stalled();

        assert!(first.ptr_eq(&second));
        assert_eq!(second.embed().config().id, "R2");
        assert_eq!(h.content.seen.borrow().len(), 2);
        assert_eq!(h.service.instances().len(), 1);
    }

    #[test]
    fn test_type_change_replaces_instance() {
        let h = harness();
        let element = report_element("r1");
        let report = h.service.embed(&element, &EmbedConfiguration::new()).unwrap();
        report.embed().on("loaded", |_| {}).unwrap();

        let dashboard = h
            .service
            .embed(
                &element,
                &EmbedConfiguration::new()
                    .with_type("dashboard")
                    .with_id("D1")
                    .with_unique_id("d1"),
            )
            .unwrap();

        assert!(!report.ptr_eq(&dashboard));
        assert_eq!(report.embed().state(), EmbedState::Reset);
        assert_eq!(report.embed().subscription_count("loaded"), 0);
        assert!(h.service.find("r1").is_none());
        assert!(h.service.get(&element).unwrap().ptr_eq(&dashboard));
    }

    #[test]
    fn test_duplicate_unique_id_on_other_element() {
        let h = harness();
        h.service
            .embed(&report_element("shared"), &EmbedConfiguration::new())
            .unwrap();

        let err = h
            .service
            .embed(&report_element("shared"), &EmbedConfiguration::new())
            .unwrap_err();
        assert_eq!(err, ServiceError::DuplicateUniqueId(UniqueId::new("shared")));
    }

    #[test]
    fn test_type_change_onto_taken_unique_id_is_refused() {
        let h = harness();
        let element = report_element("r1");
        let report = h.service.embed(&element, &EmbedConfiguration::new()).unwrap();
        h.service
            .embed(&report_element("taken"), &EmbedConfiguration::new())
            .unwrap();

        let err = h
            .service
            .embed(
                &element,
                &EmbedConfiguration::new()
                    .with_type("dashboard")
                    .with_id("D1")
                    .with_unique_id("taken"),
            )
            .unwrap_err();

        assert_eq!(err, ServiceError::DuplicateUniqueId(UniqueId::new("taken")));
        assert_ne!(report.embed().state(), EmbedState::Reset);
        assert!(h.service.get(&element).unwrap().ptr_eq(&report));
    }

    #[test]
    fn test_type_change_may_keep_own_unique_id() {
        let h = harness();
        let element = report_element("r1");
        h.service.embed(&element, &EmbedConfiguration::new()).unwrap();

        let dashboard = h
            .service
            .embed(
                &element,
                &EmbedConfiguration::new().with_type("dashboard").with_id("D1"),
            )
            .unwrap();

        assert_eq!(dashboard.embed_type(), EmbedType::Dashboard);
        assert!(h.service.find("r1").unwrap().ptr_eq(&dashboard));
    }

    #[test]
    fn test_events_route_to_addressed_instance_only() {
        let h = harness();
        let first = h
            .service
            .embed(&report_element("r1"), &EmbedConfiguration::new())
            .unwrap();
        let second = h
            .service
            .embed(&report_element("r2"), &EmbedConfiguration::new())
            .unwrap();

        let hits = Rc::new(RefCell::new(Vec::new()));
        for (tag, instance) in [("first", &first), ("second", &second)] {
            let hits = Rc::clone(&hits);
            instance
                .embed()
                .on("filtersApplied", move |_| hits.borrow_mut().push(tag))
                .unwrap();
        }

        let code = post_event(
            &h.pair,
            "/reports/r1/events/filtersApplied",
            json!({ "initiator": "sdk" }),
        );
        assert_eq!(code, status::ACCEPTED);
        assert_eq!(*hits.borrow(), vec!["first"]);
    }

    #[test]
    fn test_scoped_events_carry_page_and_visual() {
        let h = harness();
        let instance = h
            .service
            .embed(&report_element("r1"), &EmbedConfiguration::new())
            .unwrap();
        let scopes = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&scopes);
        instance
            .embed()
            .on("filtersApplied", move |event| {
                recorded
                    .borrow_mut()
                    .push((event.page_name.clone(), event.visual_name.clone()));
            })
            .unwrap();

        post_event(&h.pair, "/reports/r1/pages/p1/events/filtersApplied", json!({}));
        post_event(
            &h.pair,
            "/reports/r1/pages/p1/visuals/v1/events/filtersApplied",
            json!({}),
        );

        assert_eq!(
            *scopes.borrow(),
            vec![
                (Some("p1".to_string()), None),
                (Some("p1".to_string()), Some("v1".to_string())),
            ]
        );
    }

    #[test]
    fn test_event_for_unknown_instance_is_acknowledged() {
        let h = harness();
        let code = post_event(&h.pair, "/reports/ghost/events/loaded", json!({}));
        assert_eq!(code, status::ACCEPTED);
    }

    #[test]
    fn test_init_embeds_marked_descendants() {
        let h = harness();
        let document = FakeElement::new("body").shared();
        let marked = report_element("r1");
        let section = FakeElement::new("section").shared();
        let nested = report_element("r2");
        let broken: ElementRef = FakeElement::new("div")
            .with_attribute("powerbi-embed-url", "https://host/embed")
            .shared();
        section.append_child(nested.clone());
        section.append_child(broken.clone());
        document.append_child(marked.clone());
        document.append_child(section);
        h.service.set_document(document);

        h.service.init(None);

        assert!(h.service.get(&marked).is_ok());
        assert!(h.service.get(&nested).is_ok());
        assert!(h.service.get(&broken).is_err());
    }

    #[test]
    fn test_stop_tears_down_transport_once() {
        let h = harness();
        h.service.stop();
        h.service.stop();

        assert!(h.service.is_stopped());
        assert!(h.pair.host.is_stopped());
        let err = h
            .service
            .embed(&report_element("r1"), &EmbedConfiguration::new())
            .unwrap_err();
        assert_eq!(err, ServiceError::Stopped);
    }

    #[test]
    fn test_service_config_from_json() {
        let config: ServiceConfig =
            serde_json::from_value(json!({ "wpmpName": "embed-host", "logMessages": true }))
                .unwrap();
        assert_eq!(config.wpmp_name.as_deref(), Some("embed-host"));
        assert!(config.log_messages);
        assert_eq!(config.access_token, None);
    }
}
