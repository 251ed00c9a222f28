//! Embedding Test Utilities
//!
//! This crate provides shared utilities for end-to-end embedding tests.
//!
//! ## Test Philosophy
//!
//! - **Real wiring**: host service and simulated content talk over a loopback window pair
//! - **Deterministic scheduling**: background loads only run when a test settles the pool
//! - **Isolation**: events reach only the instance they are addressed to

use core_types::EmbedType;
use embed_components::{Embed, EmbedEvent};
use futures::executor::LocalPool;
use host_dom::{ElementRef, FakeElement};
use loopback_ipc::WindowPair;
use services_embed::{Service, ServiceConfig};
use sim_content_host::SimulatedContent;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

/// Host service and simulated content wired together
pub struct TestSystem {
    pub pool: LocalPool,
    pub pair: WindowPair,
    pub service: Service,
    pub content: SimulatedContent,
}

impl TestSystem {
    /// Runs background work and delivers queued events until nothing is left
    pub fn settle(&mut self) {
        loop {
            self.pool.run_until_stalled();
            if self.content.pending_events() == 0 {
                break;
            }
            self.pool.run_until(self.content.flush_events());
        }
    }

    /// Awaits `future`, then settles
    pub fn run<F: Future>(&mut self, future: F) -> F::Output {
        let output = self.pool.run_until(future);
        self.settle();
        output
    }
}

/// Bootstrap helper for tests
///
/// Creates a window pair, a service on the host side and simulated content
/// on the other.
pub fn test_bootstrap() -> TestSystem {
    bootstrap_with(ServiceConfig::default())
}

pub fn bootstrap_with(config: ServiceConfig) -> TestSystem {
    let pool = LocalPool::new();
    let pair = WindowPair::new("host", "content", false);

    let content = SimulatedContent::new(Rc::new(pair.content_to_host()));
    content.install(&*pair.content);

    let service = Service::new(
        config,
        pair.host.clone(),
        Rc::new(pair.host_to_content()),
        Rc::new(pool.spawner()),
    );

    TestSystem {
        pool,
        pair,
        service,
        content,
    }
}

/// Element carrying everything needed to embed `embed_type` content
pub fn element_for(embed_type: EmbedType, unique_id: &str) -> ElementRef {
    let parameter = embed_config::id_parameter(embed_type);
    FakeElement::new("div")
        .with_attribute(
            "powerbi-embed-url",
            format!("https://app.example/{}Embed?{parameter}=C1", embed_type.as_str()),
        )
        .with_attribute("powerbi-type", embed_type.as_str())
        .with_attribute("powerbi-access-token", "T")
        .with_attribute("powerbi-name", unique_id)
        .shared()
}

pub fn report_element(unique_id: &str) -> ElementRef {
    element_for(EmbedType::Report, unique_id)
}

/// Records every event named `name` delivered to `embed`
pub fn capture(embed: &Embed, name: &str) -> Rc<RefCell<Vec<EmbedEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    embed
        .on(name, move |event| sink.borrow_mut().push(event.clone()))
        .unwrap_or_else(|err| panic!("cannot subscribe to {name}: {err}"));
    seen
}
