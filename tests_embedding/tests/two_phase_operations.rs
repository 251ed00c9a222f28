//! Two-Phase Operation Tests
//!
//! Validates operations against content that validates before applying,
//! and the events that follow accepted changes.

use embed_components::{EmbedError, EmbedState, Filterable, Initiator, Report};
use embed_config::EmbedConfiguration;
use ipc::{status, Filter, SettingsPatch, Transport};
use serde_json::json;
use sim_content_host::Phase;
use tests_embedding::{capture, report_element, test_bootstrap, TestSystem};

fn loaded_report(system: &mut TestSystem, unique_id: &str) -> Report {
    let instance = system
        .service
        .embed(&report_element(unique_id), &EmbedConfiguration::default())
        .expect("embed succeeds");
    system.settle();
    assert_eq!(instance.embed().state(), EmbedState::Loaded);
    instance.as_report().cloned().expect("instance is a report")
}

fn good_filter() -> Filter {
    Filter::new(json!({
        "$schema": "http://powerbi.com/product/schema#basic",
        "target": { "table": "Store", "column": "Chain" },
        "operator": "In",
        "values": ["Contoso"]
    }))
}

fn bad_filter() -> Filter {
    Filter::new(json!({ "operator": "In", "values": [] }))
}

/// Test: a filter rejected by validation is never applied
#[test]
fn test_invalid_filter_rejected_without_apply() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");
    let applied = capture(report.embed(), "filtersApplied");

    let err = system.run(report.set_filters(vec![bad_filter()])).unwrap_err();

    match &err {
        EmbedError::RemoteValidation { body } => {
            assert_eq!(body[0]["message"], json!("filter 0 is missing $schema"));
            assert_eq!(body[1]["message"], json!("filter 0 is missing target"));
        }
        other => panic!("expected a validation rejection, got {other:?}"),
    }
    assert_eq!(err.status_code(), Some(status::BAD_REQUEST));
    assert_eq!(system.content.call_count("setFilters", Phase::Validate), 1);
    assert_eq!(system.content.call_count("setFilters", Phase::Apply), 0);
    assert!(system.content.document("r1").unwrap().filters.is_empty());
    assert!(applied.borrow().is_empty());
}

/// Test: an accepted filter resolves and is followed by filtersApplied
#[test]
fn test_valid_filter_applies_and_raises_event() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");
    let applied = capture(report.embed(), "filtersApplied");

    let outcome = system.run(report.set_filters(vec![good_filter()]));

    assert_eq!(outcome, Ok(()));
    assert_eq!(system.content.call_count("setFilters", Phase::Apply), 1);
    let applied = applied.borrow();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].initiator, Some(Initiator::Sdk));
    assert_eq!(applied[0].page_name, None);

    let filters = system.run(report.get_filters()).unwrap();
    assert_eq!(filters, vec![good_filter()]);
}

/// Test: page and visual filters are kept apart
#[test]
fn test_filters_per_node() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");
    let page = report.page("ReportSection1", None);
    let visual = page.visual("VisualContainer2");
    let applied = capture(report.embed(), "filtersApplied");

    system.run(visual.set_filters(vec![good_filter()])).unwrap();

    assert_eq!(system.run(visual.get_filters()).unwrap(), vec![good_filter()]);
    assert!(system.run(page.get_filters()).unwrap().is_empty());
    assert!(system.run(report.get_filters()).unwrap().is_empty());
    assert_eq!(
        applied.borrow()[0].visual_name.as_deref(),
        Some("VisualContainer2")
    );

    system.run(visual.remove_filters()).unwrap();
    assert!(system.run(visual.get_filters()).unwrap().is_empty());
}

/// Test: reload replays the last acknowledged load
#[test]
fn test_reload_replays_last_load() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");

    system
        .run(report.embed().load(ipc::LoadConfiguration::new("X", "T")))
        .unwrap();
    assert_eq!(system.content.document("r1").unwrap().id, "X");

    system.run(report.embed().reload()).unwrap();

    assert_eq!(system.content.call_count("load", Phase::Apply), 3);
    assert_eq!(system.content.document("r1").unwrap().id, "X");
    assert_eq!(report.get_id(), "X");
    assert_eq!(report.embed().state(), EmbedState::Loaded);
}

/// Test: pages come from the content and setting one raises pageChanged
#[test]
fn test_pages_and_page_changes() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");
    let changed = capture(report.embed(), "pageChanged");

    let pages = system.run(report.get_pages()).unwrap();
    let names: Vec<&str> = pages.iter().map(|page| page.name()).collect();
    assert_eq!(names, vec!["ReportSection1", "ReportSection2"]);

    system.run(pages[1].set_active()).unwrap();

    let changed = changed.borrow();
    let new_page = changed[0].new_page.as_ref().expect("pageChanged carries the page");
    assert_eq!(new_page, &pages[1]);
    assert_eq!(new_page.display_name(), Some("Regions"));
    assert_eq!(
        system.content.document("r1").unwrap().active_page.as_deref(),
        Some("ReportSection2")
    );

    let visuals = system.run(new_page.get_visuals()).unwrap();
    assert_eq!(visuals.len(), 1);
    assert_eq!(visuals[0].name(), "VisualContainer3");
}

/// Test: activating a page the content does not have is a validation error
#[test]
fn test_unknown_page_rejected() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");

    let err = system.run(report.set_page("Missing")).unwrap_err();

    assert!(matches!(err, EmbedError::RemoteValidation { .. }));
    assert_eq!(system.content.call_count("setPage", Phase::Apply), 0);
}

/// Test: a failing apply rejects with 500 and raises an error event
#[test]
fn test_failed_apply_is_remote_operation_error() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");
    let errors = capture(report.embed(), "error");
    system.content.fail_next_apply();

    let err = system.run(report.print()).unwrap_err();

    assert_eq!(err.status_code(), Some(status::INTERNAL_SERVER_ERROR));
    assert_eq!(
        err.body(),
        Some(&json!([{ "message": "print could not be applied" }]))
    );
    assert_eq!(errors.borrow().len(), 1);

    assert_eq!(system.run(report.refresh()), Ok(()));
}

/// Test: acknowledged settings are applied and replayed on reload
#[test]
fn test_settings_update_and_replay() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");
    let updated = capture(report.embed(), "settingsUpdated");

    system
        .run(report.update_settings(SettingsPatch {
            filter_pane_enabled: Some(false),
            nav_content_pane_enabled: None,
        }))
        .unwrap();

    assert_eq!(updated.borrow().len(), 1);
    assert!(!system.content.document("r1").unwrap().filter_pane_enabled);
    assert!(!report.embed().config().settings.filter_pane_enabled);

    system.run(report.embed().reload()).unwrap();
    let document = system.content.document("r1").unwrap();
    assert!(!document.filter_pane_enabled);
    assert!(document.nav_content_pane_enabled);
}

/// Test: a failed load leaves the instance in LoadFailed
#[test]
fn test_failed_initial_load() {
    let mut system = test_bootstrap();
    system.content.fail_next_apply();
    let instance = system
        .service
        .embed(&report_element("r1"), &EmbedConfiguration::default())
        .unwrap();
    let errors = capture(instance.embed(), "error");

    system.settle();

    assert_eq!(instance.embed().state(), EmbedState::LoadFailed);
    assert_eq!(errors.borrow().len(), 1);

    system.run(instance.embed().reload()).unwrap();
    assert_eq!(instance.embed().state(), EmbedState::Loaded);
}

/// Test: operations after the transport stops fail without a status code
#[test]
fn test_operations_after_stop_are_transport_errors() {
    let mut system = test_bootstrap();
    let report = loaded_report(&mut system, "r1");
    system.pair.content.stop();

    let err = system.run(report.refresh()).unwrap_err();

    assert!(matches!(err, EmbedError::Transport(_)));
    assert_eq!(err.status_code(), None);
}
