//! Event subscriptions and fan-out
//!
//! Each instance owns one [`SubscriptionRegistry`]. Dispatch copies the
//! matching handlers out of the registry before invoking them, so a handler
//! may subscribe or unsubscribe while running.

use crate::report::Page;
use core_types::UniqueId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Events every content type raises
pub const BASE_EVENTS: &[&str] = &["loaded", "error"];

/// Who triggered the change behind an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Initiator {
    /// The host called an operation
    Sdk,
    /// The content's own UI
    User,
}

/// Structured event handed to subscribers
#[derive(Debug, Clone)]
pub struct EmbedEvent {
    pub name: String,
    pub unique_id: UniqueId,
    /// Set for page- and visual-scoped events
    pub page_name: Option<String>,
    /// Set for visual-scoped events
    pub visual_name: Option<String>,
    /// Message body, unmodified
    pub detail: Value,
    pub initiator: Option<Initiator>,
    /// New active page of a `pageChanged` event on a report
    pub new_page: Option<Page>,
}

impl EmbedEvent {
    pub fn new(name: impl Into<String>, unique_id: UniqueId, detail: Value) -> Self {
        let initiator = detail
            .get("initiator")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok());

        Self {
            name: name.into(),
            unique_id,
            page_name: None,
            visual_name: None,
            detail,
            initiator,
            new_page: None,
        }
    }
}

/// Where an inbound event was addressed inside an instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventScope {
    pub page_name: Option<String>,
    pub visual_name: Option<String>,
}

impl EventScope {
    pub fn instance() -> Self {
        Self::default()
    }

    pub fn page(page_name: impl Into<String>) -> Self {
        Self {
            page_name: Some(page_name.into()),
            visual_name: None,
        }
    }

    pub fn visual(page_name: impl Into<String>, visual_name: impl Into<String>) -> Self {
        Self {
            page_name: Some(page_name.into()),
            visual_name: Some(visual_name.into()),
        }
    }
}

/// Subscriber callback
///
/// Two handlers are the same subscriber when they share the same
/// allocation; clone a handler to unsubscribe it later.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&EmbedEvent)>);

impl EventHandler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&EmbedEvent) + 'static,
    {
        Self(Rc::new(callback))
    }

    pub fn same_as(&self, other: &EventHandler) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }

    fn call(&self, event: &EmbedEvent) {
        (self.0)(event)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Ordered `(event name, handler)` pairs of one instance
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<(String, EventHandler)>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, handler: EventHandler) {
        self.entries.push((name.to_string(), handler));
    }

    /// Removes every entry pairing `name` with `handler`
    pub fn remove(&mut self, name: &str, handler: &EventHandler) {
        self.entries
            .retain(|(entry_name, entry)| !(entry_name == name && entry.same_as(handler)));
    }

    /// Removes every entry for `name`
    pub fn remove_all(&mut self, name: &str) {
        self.entries.retain(|(entry_name, _)| entry_name != name);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Handlers for `name` in registration order
    pub fn handlers_for(&self, name: &str) -> Vec<EventHandler> {
        self.entries
            .iter()
            .filter(|(entry_name, _)| entry_name == name)
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries
            .iter()
            .filter(|(entry_name, _)| entry_name == name)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Invokes every handler in order, isolating panics
///
/// Returns how many handlers completed.
pub fn fan_out(handlers: &[EventHandler], event: &EmbedEvent) -> usize {
    let mut completed = 0;
    for handler in handlers {
        match catch_unwind(AssertUnwindSafe(|| handler.call(event))) {
            Ok(()) => completed += 1,
            Err(_) => {
                tracing::warn!(
                    unique_id = %event.unique_id,
                    event = %event.name,
                    "subscriber panicked; continuing with remaining subscribers"
                );
            }
        }
    }
    completed
}
