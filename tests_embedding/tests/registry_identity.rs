//! Registry Identity Tests
//!
//! Validates that the service binds one instance per element and finds it
//! again by element and by unique id.

use core_types::EmbedType;
use embed_components::EmbedState;
use embed_config::EmbedConfiguration;
use host_dom::{ElementRef, FakeElement, HostElement};
use services_embed::ServiceError;
use tests_embedding::{element_for, report_element, test_bootstrap};

/// Test: embed, get and find all return the same instance
#[test]
fn test_embed_get_find_identity() {
    let mut system = test_bootstrap();
    let element = report_element("sales");

    let instance = system
        .service
        .embed(&element, &EmbedConfiguration::default())
        .expect("embed succeeds");

    let got = system.service.get(&element).expect("element is bound");
    assert!(got.ptr_eq(&instance));
    let found = system.service.find("sales").expect("unique id is registered");
    assert!(found.ptr_eq(&instance));

    system.settle();
    assert_eq!(instance.embed().state(), EmbedState::Loaded);
}

/// Test: get on an element never embedded fails
#[test]
fn test_get_without_embed_is_not_embedded() {
    let system = test_bootstrap();
    let element = report_element("never");

    let err = system.service.get(&element).unwrap_err();
    assert_eq!(err, ServiceError::NotEmbedded(element.id()));
}

/// Test: reset unbinds the element and frees the unique id
#[test]
fn test_reset_unbinds_element() {
    let mut system = test_bootstrap();
    let element = report_element("sales");
    let instance = system
        .service
        .embed(&element, &EmbedConfiguration::default())
        .unwrap();
    system.settle();

    system.service.reset(&element);

    assert!(matches!(
        system.service.get(&element),
        Err(ServiceError::NotEmbedded(_))
    ));
    assert!(system.service.find("sales").is_none());
    assert_eq!(instance.embed().state(), EmbedState::Reset);
    assert!(element.frame().is_none());

    // The unique id can be used again
    let again = system
        .service
        .embed(&report_element("sales"), &EmbedConfiguration::default());
    assert!(again.is_ok());
}

/// Test: every content type has a constructor and loads
#[test]
fn test_every_type_embeds_and_loads() {
    let mut system = test_bootstrap();
    let mut instances = Vec::new();
    for embed_type in EmbedType::ALL {
        let element = element_for(embed_type, &format!("{}-1", embed_type.as_str()));
        let instance = system
            .service
            .embed(&element, &EmbedConfiguration::default())
            .unwrap();
        assert_eq!(instance.embed_type(), embed_type);
        instances.push(instance);
    }

    system.settle();

    for instance in &instances {
        assert_eq!(instance.embed().state(), EmbedState::Loaded);
        let uid = instance.embed().unique_id().to_string();
        assert_eq!(
            system.content.document(&uid).map(|document| document.kind),
            Some(instance.embed_type())
        );
    }
}

/// Test: embedding again with the same type reuses the instance
#[test]
fn test_reembed_same_type_reuses_instance() {
    let mut system = test_bootstrap();
    let element = report_element("sales");
    let first = system
        .service
        .embed(&element, &EmbedConfiguration::default())
        .unwrap();
    system.settle();

    let second = system
        .service
        .embed(&element, &EmbedConfiguration::new().with_id("R2"))
        .unwrap();
    system.settle();

    assert!(first.ptr_eq(&second));
    assert_eq!(second.embed().config().id, "R2");
    assert_eq!(system.content.document("sales").unwrap().id, "R2");
}

/// Test: embedding another content type replaces the instance
#[test]
fn test_reembed_other_type_replaces_instance() {
    let mut system = test_bootstrap();
    let element = report_element("sales");
    let report = system
        .service
        .embed(&element, &EmbedConfiguration::default())
        .unwrap();

    let dashboard = system
        .service
        .embed(
            &element,
            &EmbedConfiguration::new()
                .with_type("dashboard")
                .with_embed_url("https://app.example/dashboardEmbed?dashboardId=D1")
                .with_unique_id("board"),
        )
        .unwrap();
    system.settle();

    assert!(!report.ptr_eq(&dashboard));
    assert_eq!(report.embed().state(), EmbedState::Reset);
    assert_eq!(dashboard.embed_type(), EmbedType::Dashboard);
    assert!(system.service.find("sales").is_none());
    assert!(system.service.get(&element).unwrap().ptr_eq(&dashboard));
}

/// Test: a unique id held by a live instance cannot be reused elsewhere
#[test]
fn test_duplicate_unique_id_is_rejected() {
    let system = test_bootstrap();
    system
        .service
        .embed(&report_element("sales"), &EmbedConfiguration::default())
        .unwrap();

    let err = system
        .service
        .embed(&report_element("sales"), &EmbedConfiguration::default())
        .unwrap_err();

    assert!(matches!(err, ServiceError::DuplicateUniqueId(_)));
    assert_eq!(system.service.instances().len(), 1);
}

/// Test: a type change refused for a taken unique id leaves the old instance in place
#[test]
fn test_failed_type_change_keeps_existing_instance() {
    let mut system = test_bootstrap();
    let element = report_element("a");
    let report = system
        .service
        .embed(&element, &EmbedConfiguration::default())
        .unwrap();
    system
        .service
        .embed(&report_element("shared"), &EmbedConfiguration::default())
        .unwrap();
    system.settle();

    let err = system
        .service
        .embed(
            &element,
            &EmbedConfiguration::new()
                .with_type("dashboard")
                .with_id("D1")
                .with_unique_id("shared"),
        )
        .unwrap_err();

    assert_eq!(err, ServiceError::DuplicateUniqueId("shared".into()));
    assert_eq!(report.embed().state(), EmbedState::Loaded);
    assert!(system.service.get(&element).unwrap().ptr_eq(&report));
    assert!(system.service.find("a").unwrap().ptr_eq(&report));
    assert!(element.frame().is_some());
    assert_eq!(system.service.instances().len(), 2);
}

/// Test: init embeds every marked element below the document
#[test]
fn test_init_scans_document() {
    let mut system = test_bootstrap();
    let document = FakeElement::new("body").shared();
    let section = FakeElement::new("section").shared();
    section.append_child(report_element("a"));
    document.append_child(section);
    document.append_child(element_for(EmbedType::Tile, "b"));
    document.append_child(FakeElement::new("p").shared());
    // Marked but unusable: no access token anywhere
    document.append_child(
        FakeElement::new("div")
            .with_attribute("powerbi-embed-url", "https://app.example/reportEmbed?reportId=X")
            .with_attribute("powerbi-type", "report")
            .shared(),
    );
    system.service.set_document(document);

    system.service.init(None);
    system.settle();

    assert_eq!(system.service.instances().len(), 2);
    assert!(system.service.find("a").is_some());
    assert!(system.service.find("b").is_some());
}

/// Test: the default access token fills in for elements without one
#[test]
fn test_default_access_token() {
    let mut system = test_bootstrap();
    system.service.set_access_token("DEFAULT");
    let element: ElementRef = FakeElement::new("div")
        .with_attribute("powerbi-embed-url", "https://app.example/reportEmbed?reportId=X")
        .with_attribute("powerbi-type", "report")
        .shared();

    let instance = system
        .service
        .embed(&element, &EmbedConfiguration::default())
        .unwrap();
    system.settle();

    assert_eq!(instance.embed().config().access_token, "DEFAULT");
    assert_eq!(instance.embed().state(), EmbedState::Loaded);
}

/// Test: after stop nothing new can be embedded and events no longer arrive
#[test]
fn test_stop_shuts_down_embedding() {
    let mut system = test_bootstrap();
    let element = report_element("sales");
    system
        .service
        .embed(&element, &EmbedConfiguration::default())
        .unwrap();
    system.settle();

    system.service.stop();

    assert!(system.service.is_stopped());
    let err = system
        .service
        .embed(&report_element("other"), &EmbedConfiguration::default())
        .unwrap_err();
    assert_eq!(err, ServiceError::Stopped);
    assert!(system.content.raise_user_event(
        "sales",
        sim_content_host::EventTarget::Instance,
        "loaded",
        serde_json::json!({})
    ));
    assert_eq!(system.pool.run_until(system.content.flush_events()), 0);
}
