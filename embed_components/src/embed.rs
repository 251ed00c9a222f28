//! The embedded instance shared by every content type

use crate::error::EmbedError;
use crate::events::{fan_out, EmbedEvent, EventHandler, EventScope, SubscriptionRegistry, BASE_EVENTS};
use crate::report::Report;
use core_types::{ElementId, EmbedType, UniqueId};
use embed_config::ResolvedConfiguration;
use host_dom::{ElementRef, FrameSpec, HostElement};
use ipc::{Addressing, LoadConfiguration, PageDescriptor, RequestChannel};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Lifecycle of one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedState {
    /// Constructed, no frame yet
    Unembedded,
    /// Frame attached, first load not acknowledged
    Embedding,
    Loaded,
    /// A later load is in flight
    Reloading,
    /// The last load was rejected; load may be retried
    LoadFailed,
    /// Torn down; terminal
    Reset,
}

/// Everything a constructor needs to build an instance
pub struct EmbedParts {
    pub config: ResolvedConfiguration,
    pub element: ElementRef,
    pub channel: Rc<dyn RequestChannel>,
}

struct EmbedInner {
    embed_type: EmbedType,
    unique_id: UniqueId,
    config: RefCell<ResolvedConfiguration>,
    element: ElementRef,
    channel: Rc<dyn RequestChannel>,
    state: Cell<EmbedState>,
    subscriptions: RefCell<SubscriptionRegistry>,
    allowed_events: Vec<&'static str>,
}

/// One embedded content surface bound to a host element
///
/// Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct Embed {
    inner: Rc<EmbedInner>,
}

impl Embed {
    /// Builds an instance whose allowed events are the base set plus `events`
    pub fn new(parts: EmbedParts, events: &[&'static str]) -> Self {
        let mut allowed_events: Vec<&'static str> = BASE_EVENTS.to_vec();
        for event in events {
            if !allowed_events.contains(event) {
                allowed_events.push(event);
            }
        }

        Self {
            inner: Rc::new(EmbedInner {
                embed_type: parts.config.embed_type,
                unique_id: parts.config.unique_id.clone(),
                config: RefCell::new(parts.config),
                element: parts.element,
                channel: parts.channel,
                state: Cell::new(EmbedState::Unembedded),
                subscriptions: RefCell::new(SubscriptionRegistry::new()),
                allowed_events,
            }),
        }
    }

    pub fn embed_type(&self) -> EmbedType {
        self.inner.embed_type
    }

    /// Identifier fixed at construction
    pub fn unique_id(&self) -> &UniqueId {
        &self.inner.unique_id
    }

    /// Snapshot of the stored configuration
    pub fn config(&self) -> ResolvedConfiguration {
        self.inner.config.borrow().clone()
    }

    pub fn state(&self) -> EmbedState {
        self.inner.state.get()
    }

    pub fn element(&self) -> &ElementRef {
        &self.inner.element
    }

    pub fn element_id(&self) -> ElementId {
        self.inner.element.id()
    }

    pub fn frame(&self) -> Option<FrameSpec> {
        self.inner.element.frame()
    }

    pub fn allowed_events(&self) -> &[&'static str] {
        &self.inner.allowed_events
    }

    pub fn is_event_allowed(&self, name: &str) -> bool {
        self.inner.allowed_events.iter().any(|allowed| *allowed == name)
    }

    /// Checks if both handles point at the same instance
    pub fn ptr_eq(&self, other: &Embed) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Attaches the content frame and enters `Embedding`
    ///
    /// Returns the load configuration the caller should send next.
    pub fn attach(&self) -> LoadConfiguration {
        let config = self.inner.config.borrow();
        self.inner
            .element
            .attach_frame(FrameSpec::filling(config.embed_url.clone()));
        self.inner.state.set(EmbedState::Embedding);
        tracing::debug!(unique_id = %self.inner.unique_id, src = %config.embed_url, "frame attached");
        config.to_load_configuration()
    }

    /// Loads content; on acknowledgment the configuration becomes the one `reload` replays
    pub async fn load(&self, load: LoadConfiguration) -> Result<(), EmbedError> {
        let previous = self.state();
        self.transition(match previous {
            EmbedState::Unembedded | EmbedState::Embedding => EmbedState::Embedding,
            _ => EmbedState::Reloading,
        });

        let url = format!("{}/load", self.embed_type().route_base());
        let body = to_body(&load)?;
        match self
            .inner
            .channel
            .post(&url, body, Some(self.addressing()))
            .await
        {
            Ok(_) => {
                self.inner.config.borrow_mut().merge_load(&load);
                self.transition(EmbedState::Loaded);
                tracing::debug!(unique_id = %self.inner.unique_id, id = %load.id, "load acknowledged");
                Ok(())
            }
            Err(failure) => {
                self.transition(EmbedState::LoadFailed);
                tracing::debug!(unique_id = %self.inner.unique_id, error = %failure, "load rejected");
                Err(failure.into())
            }
        }
    }

    /// Replays the last acknowledged load configuration
    pub async fn reload(&self) -> Result<(), EmbedError> {
        let load = self.inner.config.borrow().to_load_configuration();
        self.load(load).await
    }

    /// Subscribes a callback and returns its handle for [`Embed::off`]
    pub fn on<F>(&self, name: &str, callback: F) -> Result<EventHandler, EmbedError>
    where
        F: Fn(&EmbedEvent) + 'static,
    {
        let handler = EventHandler::new(callback);
        self.subscribe(name, handler.clone())?;
        Ok(handler)
    }

    /// Subscribes an existing handler
    pub fn subscribe(&self, name: &str, handler: EventHandler) -> Result<(), EmbedError> {
        self.check_event(name)?;
        self.inner.subscriptions.borrow_mut().add(name, handler);
        Ok(())
    }

    /// Removes one subscription, or every subscription for `name` when `handler` is `None`
    pub fn off(&self, name: &str, handler: Option<&EventHandler>) -> Result<(), EmbedError> {
        self.check_event(name)?;
        let mut subscriptions = self.inner.subscriptions.borrow_mut();
        match handler {
            Some(handler) => subscriptions.remove(name, handler),
            None => subscriptions.remove_all(name),
        }
        Ok(())
    }

    pub fn subscription_count(&self, name: &str) -> usize {
        self.inner.subscriptions.borrow().count(name)
    }

    pub fn fullscreen(&self) {
        self.inner.element.set_fullscreen(true);
    }

    pub fn exit_fullscreen(&self) {
        self.inner.element.set_fullscreen(false);
    }

    /// Delivers an inbound event to this instance's subscribers
    ///
    /// Returns how many subscribers completed. A torn-down instance ignores
    /// events.
    pub fn deliver_event(&self, scope: EventScope, name: &str, detail: Value) -> usize {
        if self.state() == EmbedState::Reset {
            return 0;
        }

        let handlers = self.inner.subscriptions.borrow().handlers_for(name);
        let mut event = EmbedEvent::new(name, self.inner.unique_id.clone(), detail);
        event.page_name = scope.page_name;
        event.visual_name = scope.visual_name;
        if name == "pageChanged" && self.embed_type() == EmbedType::Report {
            event.new_page = event
                .detail
                .get("newPage")
                .cloned()
                .and_then(|value| serde_json::from_value::<PageDescriptor>(value).ok())
                .map(|page| Report::from_embed(self.clone()).page(page.name, page.display_name));
        }

        tracing::debug!(
            unique_id = %self.inner.unique_id,
            event = name,
            subscribers = handlers.len(),
            "dispatching event"
        );
        fan_out(&handlers, &event)
    }

    /// Drops subscriptions, empties the host element and enters `Reset`
    pub fn teardown(&self) {
        self.inner.state.set(EmbedState::Reset);
        self.inner.subscriptions.borrow_mut().clear();
        self.inner.element.clear();
    }

    pub(crate) fn addressing(&self) -> Addressing {
        Addressing::new(self.inner.unique_id.as_str())
    }

    pub(crate) fn channel(&self) -> &Rc<dyn RequestChannel> {
        &self.inner.channel
    }

    pub(crate) fn update_settings_locally(&self, patch: &ipc::SettingsPatch) {
        self.inner.config.borrow_mut().settings.apply(patch);
    }

    fn check_event(&self, name: &str) -> Result<(), EmbedError> {
        if self.is_event_allowed(name) {
            Ok(())
        } else {
            Err(EmbedError::UnsupportedEvent {
                name: name.to_string(),
            })
        }
    }

    fn transition(&self, next: EmbedState) {
        // Outcomes resolving after a reset must not revive the instance.
        if self.inner.state.get() != EmbedState::Reset {
            self.inner.state.set(next);
        }
    }
}

impl fmt::Debug for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embed")
            .field("embed_type", &self.inner.embed_type)
            .field("unique_id", &self.inner.unique_id)
            .field("state", &self.inner.state.get())
            .finish()
    }
}

pub(crate) fn to_body<T: Serialize>(value: &T) -> Result<Value, EmbedError> {
    serde_json::to_value(value).map_err(|err| EmbedError::UnexpectedBody(err.to_string()))
}

pub(crate) fn from_body<T: DeserializeOwned>(body: Value) -> Result<T, EmbedError> {
    serde_json::from_value(body).map_err(|err| EmbedError::UnexpectedBody(err.to_string()))
}
