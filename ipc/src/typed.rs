//! Typed payloads exchanged with the content window.
//!
//! These are the bodies of the embedding protocol. Filters are owned by a
//! separate model library; here they are an opaque JSON value forwarded
//! unmodified.

use core_types::EmbedType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page as listed by the content (`GET /report/pages`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl PageDescriptor {
    /// Page reference used to activate a page by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }
}

/// Visual as listed by the content (`GET /report/pages/{name}/visuals`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualDescriptor {
    pub name: String,
}

/// Opaque filter (basic or advanced shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(pub Value);

impl Filter {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Partial settings update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_pane_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_content_pane_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.filter_pane_enabled.is_none() && self.nav_content_pane_enabled.is_none()
    }
}

/// Body of a `load` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfiguration {
    pub id: String,
    pub access_token: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub embed_type: Option<EmbedType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsPatch>,
}

impl LoadConfiguration {
    pub fn new(id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            access_token: access_token.into(),
            embed_type: None,
            settings: None,
        }
    }

    pub fn with_settings(mut self, settings: SettingsPatch) -> Self {
        self.settings = Some(settings);
        self
    }
}
