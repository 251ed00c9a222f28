//! Element and unique-id tables of live instances

use crate::ServiceError;
use core_types::{ElementId, UniqueId};
use embed_components::Instance;
use std::collections::HashMap;

/// Live instances, keyed by host element and by unique id
///
/// Both maps always describe the same set of instances.
#[derive(Default)]
pub struct InstanceTable {
    by_element: HashMap<ElementId, Instance>,
    by_unique_id: HashMap<UniqueId, ElementId>,
}

impl InstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instance under its element and unique id
    pub fn insert(&mut self, instance: Instance) -> Result<(), ServiceError> {
        let embed = instance.embed();
        let unique_id = embed.unique_id().clone();
        if self.by_unique_id.contains_key(&unique_id) {
            return Err(ServiceError::DuplicateUniqueId(unique_id));
        }

        let element_id = embed.element_id();
        if let Some(previous) = self.by_element.remove(&element_id) {
            self.by_unique_id.remove(previous.embed().unique_id());
        }
        self.by_unique_id.insert(unique_id, element_id);
        self.by_element.insert(element_id, instance);
        Ok(())
    }

    pub fn remove(&mut self, element_id: ElementId) -> Option<Instance> {
        let instance = self.by_element.remove(&element_id)?;
        self.by_unique_id.remove(instance.embed().unique_id());
        Some(instance)
    }

    pub fn get(&self, element_id: ElementId) -> Option<&Instance> {
        self.by_element.get(&element_id)
    }

    pub fn find(&self, unique_id: &str) -> Option<&Instance> {
        let element_id = self.by_unique_id.get(&UniqueId::new(unique_id))?;
        self.by_element.get(element_id)
    }

    pub fn contains_unique_id(&self, unique_id: &UniqueId) -> bool {
        self.by_unique_id.contains_key(unique_id)
    }

    pub fn instances(&self) -> Vec<Instance> {
        self.by_element.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }
}
