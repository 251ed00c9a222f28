//! Host-element attribute vocabulary

use core_types::EmbedType;
use host_dom::HostElement;

pub const EMBED_URL: &str = "powerbi-embed-url";
pub const TYPE: &str = "powerbi-type";
pub const ACCESS_TOKEN: &str = "powerbi-access-token";
/// Supplies the unique id
pub const NAME: &str = "powerbi-name";
pub const FILTER_PANE_ENABLED: &str = "powerbi-settings-filter-pane-enabled";
pub const NAV_CONTENT_PANE_ENABLED: &str = "powerbi-settings-nav-content-pane-enabled";

/// Attribute carrying the content id for a type
pub fn content_id(embed_type: EmbedType) -> &'static str {
    match embed_type {
        EmbedType::Report => "powerbi-report-id",
        EmbedType::Dashboard => "powerbi-dashboard-id",
        EmbedType::Tile => "powerbi-tile-id",
        EmbedType::Qna => "powerbi-qna-id",
    }
}

/// Reads an attribute, treating an empty value as absent
pub fn read(element: &dyn HostElement, name: &str) -> Option<String> {
    element.attribute(name).filter(|value| !value.is_empty())
}

/// Reads a pane flag; only the literal `"false"` disables
pub fn read_flag(element: &dyn HostElement, name: &str) -> Option<bool> {
    read(element, name).map(|value| value != "false")
}
