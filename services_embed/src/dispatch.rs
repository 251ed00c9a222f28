//! Routes for events posted by the content window

use crate::ServiceInner;
use core_types::EmbedType;
use embed_components::EventScope;
use ipc::status;
use path_router::{RouteRequest, Router};
use std::rc::{Rc, Weak};

/// Registers the event routes of every content type on `router`
///
/// Every matched event is acknowledged with 202, whether or not a live
/// instance receives it.
pub(crate) fn register_event_routes(router: &Router, service: &Rc<ServiceInner>) {
    for embed_type in EmbedType::ALL {
        let collection = embed_type.event_collection();
        route(
            router,
            service,
            embed_type,
            &format!("/{collection}/:uniqueId/events/:eventName"),
        );
    }

    route(
        router,
        service,
        EmbedType::Report,
        "/reports/:uniqueId/pages/:pageName/events/:eventName",
    );
    route(
        router,
        service,
        EmbedType::Report,
        "/reports/:uniqueId/pages/:pageName/visuals/:visualName/events/:eventName",
    );
}

fn route(router: &Router, service: &Rc<ServiceInner>, embed_type: EmbedType, pattern: &str) {
    let service: Weak<ServiceInner> = Rc::downgrade(service);
    router.post(pattern, move |request, responder| {
        responder.send_status(status::ACCEPTED);
        if let Some(service) = service.upgrade() {
            deliver(&service, embed_type, request);
        }
    });
}

fn deliver(service: &ServiceInner, embed_type: EmbedType, request: &RouteRequest) {
    let unique_id = request.param("uniqueId");
    let event = request.param("eventName");

    let Some(instance) = service.find_instance(unique_id) else {
        tracing::warn!(unique_id, event, "event for unknown instance ignored");
        return;
    };
    if instance.embed_type() != embed_type {
        tracing::debug!(
            unique_id,
            event,
            expected = %embed_type,
            actual = %instance.embed_type(),
            "event for another content type ignored"
        );
        return;
    }

    let scope = EventScope {
        page_name: request.params.get("pageName").map(str::to_string),
        visual_name: request.params.get("visualName").map(str::to_string),
    };
    instance
        .embed()
        .deliver_event(scope, event, request.body.clone());
}
