//! # Embed Configuration
//!
//! This crate turns what the host supplies into one authoritative
//! configuration per embedded instance.
//!
//! ## Philosophy
//!
//! - **Layered**: explicit configuration, then host-element attributes, then
//!   identifiers parsed out of the embed URL, then generated defaults
//! - **Field by field**: settings merge per field, never as a whole object
//! - **Fail with a reason**: a missing required field names the field and
//!   the attribute that was consulted
//!
//! ## Example
//!
//! ```ignore
//! let explicit = EmbedConfiguration::new().with_access_token("T");
//! let resolved = resolve(&explicit, &element, EmbedType::Report, None)?;
//! ```

pub mod attributes;
pub mod embed_url;

pub use embed_url::{find_id_from_embed_url, id_parameter};

use core_types::{EmbedType, UniqueId};
use host_dom::HostElement;
use ipc::{LoadConfiguration, SettingsPatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("embed type is missing: set `type` or the `{attribute}` attribute")]
    MissingType { attribute: &'static str },

    #[error("embed url is missing: set `embedUrl` or the `{attribute}` attribute")]
    MissingEmbedUrl { attribute: &'static str },

    #[error("access token is missing: set `accessToken`, the `{attribute}` attribute or a service-wide token")]
    MissingAccessToken { attribute: &'static str },

    #[error("content id is missing: set `id`, the `{attribute}` attribute or `{url_parameter}` in the embed url")]
    MissingIdentifier {
        attribute: &'static str,
        url_parameter: &'static str,
    },
}

impl ConfigurationError {
    /// Configuration field that could not be resolved
    pub fn field(&self) -> &'static str {
        match self {
            ConfigurationError::MissingType { .. } => "type",
            ConfigurationError::MissingEmbedUrl { .. } => "embedUrl",
            ConfigurationError::MissingAccessToken { .. } => "accessToken",
            ConfigurationError::MissingIdentifier { .. } => "id",
        }
    }

    /// Host-element attribute consulted as a fallback
    pub fn attribute(&self) -> &'static str {
        match self {
            ConfigurationError::MissingType { attribute }
            | ConfigurationError::MissingEmbedUrl { attribute }
            | ConfigurationError::MissingAccessToken { attribute }
            | ConfigurationError::MissingIdentifier { attribute, .. } => *attribute,
        }
    }
}

/// Configuration as supplied by the host; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfiguration {
    /// Content type tag, kept as text so unknown tags reach the registry
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub embed_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsPatch>,
}

impl EmbedConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, embed_type: impl Into<String>) -> Self {
        self.embed_type = Some(embed_type.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_embed_url(mut self, embed_url: impl Into<String>) -> Self {
        self.embed_url = Some(embed_url.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    pub fn with_settings(mut self, settings: SettingsPatch) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// Pane visibility, resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedSettings {
    pub filter_pane_enabled: bool,
    pub nav_content_pane_enabled: bool,
}

impl Default for EmbedSettings {
    fn default() -> Self {
        Self {
            filter_pane_enabled: true,
            nav_content_pane_enabled: true,
        }
    }
}

impl EmbedSettings {
    /// Overwrites the fields the patch sets
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(enabled) = patch.filter_pane_enabled {
            self.filter_pane_enabled = enabled;
        }
        if let Some(enabled) = patch.nav_content_pane_enabled {
            self.nav_content_pane_enabled = enabled;
        }
    }

    pub fn to_patch(self) -> SettingsPatch {
        SettingsPatch {
            filter_pane_enabled: Some(self.filter_pane_enabled),
            nav_content_pane_enabled: Some(self.nav_content_pane_enabled),
        }
    }
}

/// Final configuration of one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfiguration {
    #[serde(rename = "type")]
    pub embed_type: EmbedType,
    pub id: String,
    pub embed_url: String,
    pub access_token: String,
    pub unique_id: UniqueId,
    pub settings: EmbedSettings,
}

impl ResolvedConfiguration {
    /// Body of the `load` request for this configuration
    pub fn to_load_configuration(&self) -> LoadConfiguration {
        LoadConfiguration::new(self.id.clone(), self.access_token.clone())
            .with_settings(self.settings.to_patch())
    }

    /// Merges a load configuration that the content acknowledged
    pub fn merge_load(&mut self, load: &LoadConfiguration) {
        self.id = load.id.clone();
        self.access_token = load.access_token.clone();
        if let Some(settings) = &load.settings {
            self.settings.apply(settings);
        }
    }
}

/// Resolves the content type tag: explicit `type`, then the type attribute
pub fn resolve_type_name(
    explicit: &EmbedConfiguration,
    element: &dyn HostElement,
) -> Result<String, ConfigurationError> {
    explicit
        .embed_type
        .clone()
        .filter(|value| !value.is_empty())
        .or_else(|| attributes::read(element, attributes::TYPE))
        .ok_or(ConfigurationError::MissingType {
            attribute: attributes::TYPE,
        })
}

/// Resolves the full configuration of an instance of `embed_type`
///
/// `default_token` is the service-wide access token, consulted last.
pub fn resolve(
    explicit: &EmbedConfiguration,
    element: &dyn HostElement,
    embed_type: EmbedType,
    default_token: Option<&str>,
) -> Result<ResolvedConfiguration, ConfigurationError> {
    let embed_url = layered(&explicit.embed_url, element, attributes::EMBED_URL).ok_or(
        ConfigurationError::MissingEmbedUrl {
            attribute: attributes::EMBED_URL,
        },
    )?;

    let access_token = layered(&explicit.access_token, element, attributes::ACCESS_TOKEN)
        .or_else(|| default_token.filter(|t| !t.is_empty()).map(str::to_string))
        .ok_or(ConfigurationError::MissingAccessToken {
            attribute: attributes::ACCESS_TOKEN,
        })?;

    let id_attribute = attributes::content_id(embed_type);
    let id = layered(&explicit.id, element, id_attribute)
        .or_else(|| find_id_from_embed_url(embed_type, &embed_url))
        .ok_or(ConfigurationError::MissingIdentifier {
            attribute: id_attribute,
            url_parameter: id_parameter(embed_type),
        })?;

    let unique_id = layered(&explicit.unique_id, element, attributes::NAME)
        .map(UniqueId::new)
        .unwrap_or_else(UniqueId::generate);

    let settings = resolve_settings(explicit.settings.as_ref(), element);

    tracing::debug!(
        embed_type = %embed_type,
        unique_id = %unique_id,
        id = %id,
        "configuration resolved"
    );

    Ok(ResolvedConfiguration {
        embed_type,
        id,
        embed_url,
        access_token,
        unique_id,
        settings,
    })
}

fn layered(explicit: &Option<String>, element: &dyn HostElement, attribute: &str) -> Option<String> {
    explicit
        .clone()
        .filter(|value| !value.is_empty())
        .or_else(|| attributes::read(element, attribute))
}

fn resolve_settings(explicit: Option<&SettingsPatch>, element: &dyn HostElement) -> EmbedSettings {
    let explicit = explicit.cloned().unwrap_or_default();
    let defaults = EmbedSettings::default();
    EmbedSettings {
        filter_pane_enabled: explicit
            .filter_pane_enabled
            .or_else(|| attributes::read_flag(element, attributes::FILTER_PANE_ENABLED))
            .unwrap_or(defaults.filter_pane_enabled),
        nav_content_pane_enabled: explicit
            .nav_content_pane_enabled
            .or_else(|| attributes::read_flag(element, attributes::NAV_CONTENT_PANE_ENABLED))
            .unwrap_or(defaults.nav_content_pane_enabled),
    }
}
