//! Event contract tests
//!
//! The content window posts events to
//! `/{collection}/{uniqueId}[/pages/{page}[/visuals/{visual}]]/events/{name}`.

use core_types::EmbedType;

// ===== Event Names =====
pub const EVENT_LOADED: &str = "loaded";
pub const EVENT_ERROR: &str = "error";
pub const EVENT_PAGE_CHANGED: &str = "pageChanged";
pub const EVENT_FILTERS_APPLIED: &str = "filtersApplied";
pub const EVENT_TILE_CLICKED: &str = "tileClicked";

pub fn instance_event_url(embed_type: EmbedType, unique_id: &str, name: &str) -> String {
    format!(
        "/{}/{unique_id}/events/{name}",
        embed_type.event_collection()
    )
}

pub fn page_event_url(unique_id: &str, page: &str, name: &str) -> String {
    format!("/reports/{unique_id}/pages/{page}/events/{name}")
}

pub fn visual_event_url(unique_id: &str, page: &str, visual: &str, name: &str) -> String {
    format!("/reports/{unique_id}/pages/{page}/visuals/{visual}/events/{name}")
}

// ===== Contract Tests =====
