//! State of the content loaded for one instance

use core_types::EmbedType;
use ipc::{PageDescriptor, SettingsPatch, VisualDescriptor};
use serde_json::Value;
use std::collections::BTreeMap;

/// A page offered by the simulated content, with its visuals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    pub name: String,
    pub display_name: String,
    pub visuals: Vec<String>,
}

impl PageTemplate {
    pub fn new(name: &str, display_name: &str, visuals: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            visuals: visuals.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn descriptor(&self) -> PageDescriptor {
        PageDescriptor {
            name: self.name.clone(),
            display_name: Some(self.display_name.clone()),
        }
    }
}

/// Pages every simulated report starts with
pub fn default_catalog() -> Vec<PageTemplate> {
    vec![
        PageTemplate::new("ReportSection1", "Sales", &["VisualContainer1", "VisualContainer2"]),
        PageTemplate::new("ReportSection2", "Regions", &["VisualContainer3"]),
    ]
}

/// Where a set of filters applies
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterScope {
    Report,
    Page(String),
    Visual(String, String),
}

/// Content loaded for one `uid`
#[derive(Debug, Clone)]
pub struct ContentDocument {
    pub kind: EmbedType,
    pub id: String,
    pub pages: Vec<PageTemplate>,
    pub active_page: Option<String>,
    pub filters: BTreeMap<FilterScope, Vec<Value>>,
    pub filter_pane_enabled: bool,
    pub nav_content_pane_enabled: bool,
}

impl ContentDocument {
    pub fn new(kind: EmbedType, id: String, pages: Vec<PageTemplate>) -> Self {
        let active_page = pages.first().map(|page| page.name.clone());
        Self {
            kind,
            id,
            pages,
            active_page,
            filters: BTreeMap::new(),
            filter_pane_enabled: true,
            nav_content_pane_enabled: true,
        }
    }

    pub fn page_names(&self) -> Vec<String> {
        self.pages.iter().map(|page| page.name.clone()).collect()
    }

    pub fn page(&self, name: &str) -> Option<&PageTemplate> {
        self.pages.iter().find(|page| page.name == name)
    }

    pub fn has_visual(&self, page: &str, visual: &str) -> bool {
        self.page(page)
            .is_some_and(|page| page.visuals.iter().any(|v| v == visual))
    }

    pub fn visuals(&self, page: &str) -> Option<Vec<VisualDescriptor>> {
        self.page(page).map(|page| {
            page.visuals
                .iter()
                .map(|name| VisualDescriptor { name: name.clone() })
                .collect()
        })
    }

    pub fn filters(&self, scope: &FilterScope) -> Vec<Value> {
        self.filters.get(scope).cloned().unwrap_or_default()
    }

    pub fn apply_settings(&mut self, patch: &SettingsPatch) {
        if let Some(enabled) = patch.filter_pane_enabled {
            self.filter_pane_enabled = enabled;
        }
        if let Some(enabled) = patch.nav_content_pane_enabled {
            self.nav_content_pane_enabled = enabled;
        }
    }
}
