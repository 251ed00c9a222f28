//! # Host DOM
//!
//! This crate defines the boundary between the embedding core and the host
//! document.
//!
//! ## Philosophy
//!
//! - **The core never touches a browser**: Elements are reached through
//!   [`HostElement`], so the same core runs against a real document or a
//!   deterministic in-memory tree
//! - **The frame is data**: The created iframe is a [`FrameSpec`] value
//!
//! [`FakeElement`] is the in-memory implementation used by tests and the
//! playground.

use core_types::ElementId;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// The iframe created inside a host element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub src: String,
    pub scrolling: String,
    pub width: String,
    pub height: String,
    pub fullscreen: bool,
}

impl FrameSpec {
    /// Frame filling its host element, scrolling disabled
    pub fn filling(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            scrolling: "no".to_string(),
            width: "100%".to_string(),
            height: "100%".to_string(),
            fullscreen: false,
        }
    }
}

/// An element of the host document that can own an embedded instance
pub trait HostElement {
    /// Stable identity of the element
    fn id(&self) -> ElementId;

    /// Reads an attribute
    fn attribute(&self, name: &str) -> Option<String>;

    /// Appends the content frame
    fn attach_frame(&self, frame: FrameSpec);

    /// Returns the attached frame, if any
    fn frame(&self) -> Option<FrameSpec>;

    /// Toggles fullscreen on the attached frame; no-op without one
    fn set_fullscreen(&self, fullscreen: bool);

    /// Removes all content, including the frame
    fn clear(&self);

    /// Child elements in document order
    fn children(&self) -> Vec<ElementRef>;
}

/// Shared handle to a host element
pub type ElementRef = Rc<dyn HostElement>;

/// All descendants of `root` in document order, `root` excluded
pub fn descendants(root: &ElementRef) -> Vec<ElementRef> {
    let mut found = Vec::new();
    collect(root, &mut found);
    found
}

fn collect(element: &ElementRef, found: &mut Vec<ElementRef>) {
    for child in element.children() {
        found.push(Rc::clone(&child));
        collect(&child, found);
    }
}

/// In-memory host element
///
/// Deterministic and inspectable; attributes and children can be changed at
/// any time through a shared reference.
pub struct FakeElement {
    id: ElementId,
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    children: RefCell<Vec<ElementRef>>,
    frame: RefCell<Option<FrameSpec>>,
    clear_count: Cell<usize>,
}

impl FakeElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            id: ElementId::new(),
            tag: tag.into(),
            attributes: RefCell::new(BTreeMap::new()),
            children: RefCell::new(Vec::new()),
            frame: RefCell::new(None),
            clear_count: Cell::new(0),
        }
    }

    /// Builder-style attribute
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn shared(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes
            .borrow_mut()
            .insert(name.into(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.attributes.borrow_mut().remove(name);
    }

    pub fn append_child(&self, child: ElementRef) {
        self.children.borrow_mut().push(child);
    }

    /// Number of times the element was emptied
    pub fn clear_count(&self) -> usize {
        self.clear_count.get()
    }
}

impl HostElement for FakeElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn attach_frame(&self, frame: FrameSpec) {
        *self.frame.borrow_mut() = Some(frame);
    }

    fn frame(&self) -> Option<FrameSpec> {
        self.frame.borrow().clone()
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        if let Some(frame) = self.frame.borrow_mut().as_mut() {
            frame.fullscreen = fullscreen;
        }
    }

    fn clear(&self) {
        self.frame.borrow_mut().take();
        self.children.borrow_mut().clear();
        self.clear_count.set(self.clear_count.get() + 1);
    }

    fn children(&self) -> Vec<ElementRef> {
        self.children.borrow().clone()
    }
}
