//! Report operation contract tests
//!
//! Paths are built from the node hierarchy: report, then page, then visual.

// ===== Operation Paths =====
pub const PATH_PAGES: &str = "/report/pages";
pub const PATH_ACTIVE_PAGE: &str = "/report/pages/active";
pub const PATH_REPORT_FILTERS: &str = "/report/filters";
pub const PATH_SETTINGS: &str = "/report/settings";
pub const PATH_PRINT: &str = "/report/print";
pub const PATH_REFRESH: &str = "/report/refresh";

pub fn page_filters_path(page: &str) -> String {
    format!("/report/pages/{page}/filters")
}

pub fn page_visuals_path(page: &str) -> String {
    format!("/report/pages/{page}/visuals")
}

pub fn visual_filters_path(page: &str, visual: &str) -> String {
    format!("/report/pages/{page}/visuals/{visual}/filters")
}

// ===== Contract Tests =====
