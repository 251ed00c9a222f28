//! # Playground Runtime
//!
//! Wires a service to simulated content, embeds the scenario's document and
//! runs its steps one by one.

use crate::scenario::{Scenario, ScenarioError, Step};
use embed_components::{EmbedError, EmbedEvent, Filterable, Instance, Report};
use futures::executor::LocalPool;
use host_dom::{ElementRef, HostElement};
use ipc::Filter;
use loopback_ipc::WindowPair;
use serde_json::{json, Value};
use services_embed::{Service, ServiceConfig};
use sim_content_host::SimulatedContent;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;

/// Playground error types
#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("No instance with unique id '{0}'")]
    UnknownTarget(String),

    #[error("Instance '{0}' is not a report")]
    NotAReport(String),
}

/// Result of one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub op: &'static str,
    pub target: Option<String>,
    /// Resolved value, or the error the operation rejected with
    pub result: Result<Value, EmbedError>,
}

/// What a run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub instances: usize,
    pub steps: Vec<StepOutcome>,
    /// One line per delivered event, in order
    pub events: Vec<String>,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|step| step.result.is_err()).count()
    }
}

enum FilterOp {
    Get,
    Set(Vec<Filter>),
    Remove,
}

async fn filter_op<N: Filterable>(node: &N, op: FilterOp) -> Result<Value, EmbedError> {
    match op {
        FilterOp::Get => node.get_filters().await.map(|filters| json!(filters)),
        FilterOp::Set(filters) => node.set_filters(filters).await.map(|()| Value::Null),
        FilterOp::Remove => node.remove_filters().await.map(|()| Value::Null),
    }
}

/// Playground runtime
pub struct PlaygroundRuntime {
    scenario: Scenario,
    pool: LocalPool,
    _pair: WindowPair,
    service: Service,
    content: SimulatedContent,
    events: Rc<RefCell<Vec<String>>>,
}

impl PlaygroundRuntime {
    /// Creates a runtime with host and content windows wired together
    pub fn new(scenario: Scenario) -> Self {
        let pool = LocalPool::new();
        let pair = WindowPair::new("host", "content", scenario.log_messages);

        let content = SimulatedContent::new(Rc::new(pair.content_to_host()));
        content.install(&*pair.content);

        let config = ServiceConfig {
            wpmp_name: Some("playground".to_string()),
            log_messages: scenario.log_messages,
            access_token: scenario.access_token.clone(),
        };
        let service = Service::new(
            config,
            pair.host.clone(),
            Rc::new(pair.host_to_content()),
            Rc::new(pool.spawner()),
        );

        Self {
            scenario,
            pool,
            _pair: pair,
            service,
            content,
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Embeds the document, then runs every step
    ///
    /// Rejected operations are recorded and the run continues; a step naming
    /// an unknown instance stops the run.
    pub fn run(mut self) -> Result<RunSummary, PlaygroundError> {
        let document: ElementRef = self.scenario.build_document();
        self.service.set_document(document);
        self.service.init(None);

        let instances = self.service.instances();
        for instance in &instances {
            self.watch(instance);
        }
        self.settle();
        tracing::info!(instances = instances.len(), "document embedded");

        let steps = self.scenario.steps.clone();
        let mut outcomes = Vec::with_capacity(steps.len());
        for step in &steps {
            let result = self.execute(step)?;
            match &result {
                Ok(value) => tracing::info!(op = step.op(), target = ?step.target(), %value, "step resolved"),
                Err(err) => tracing::warn!(op = step.op(), target = ?step.target(), error = %err, "step rejected"),
            }
            outcomes.push(StepOutcome {
                op: step.op(),
                target: step.target().map(str::to_string),
                result,
            });
        }

        let events = self.events.borrow().clone();
        Ok(RunSummary {
            instances: instances.len(),
            steps: outcomes,
            events,
        })
    }

    /// Subscribes a logger to every event the instance allows
    fn watch(&self, instance: &Instance) {
        let embed = instance.embed();
        for name in embed.allowed_events() {
            let log = Rc::clone(&self.events);
            let subscribed = embed.on(name, move |event| {
                tracing::info!(
                    unique_id = %event.unique_id,
                    event = %event.name,
                    initiator = ?event.initiator,
                    "event received"
                );
                log.borrow_mut().push(describe(event));
            });
            if let Err(err) = subscribed {
                tracing::warn!(unique_id = %embed.unique_id(), error = %err, "cannot watch event");
            }
        }
    }

    fn settle(&mut self) {
        loop {
            self.pool.run_until_stalled();
            if self.content.pending_events() == 0 {
                break;
            }
            self.pool.run_until(self.content.flush_events());
        }
    }

    fn await_op<F>(&mut self, operation: F) -> Result<Value, EmbedError>
    where
        F: Future<Output = Result<Value, EmbedError>>,
    {
        let result = self.pool.run_until(operation);
        self.settle();
        result
    }

    fn instance(&self, target: &str) -> Result<Instance, PlaygroundError> {
        self.service
            .find(target)
            .ok_or_else(|| PlaygroundError::UnknownTarget(target.to_string()))
    }

    fn report(&self, target: &str) -> Result<Report, PlaygroundError> {
        self.instance(target)?
            .as_report()
            .cloned()
            .ok_or_else(|| PlaygroundError::NotAReport(target.to_string()))
    }

    fn filters(
        &mut self,
        target: &str,
        page: Option<&str>,
        visual: Option<&str>,
        op: FilterOp,
    ) -> Result<Result<Value, EmbedError>, PlaygroundError> {
        let report = self.report(target)?;
        Ok(match (page, visual) {
            (Some(page), Some(visual)) => {
                let node = report.page(page, None).visual(visual);
                self.await_op(filter_op(&node, op))
            }
            (Some(page), None) => {
                let node = report.page(page, None);
                self.await_op(filter_op(&node, op))
            }
            _ => self.await_op(filter_op(&report, op)),
        })
    }

    fn execute(&mut self, step: &Step) -> Result<Result<Value, EmbedError>, PlaygroundError> {
        let result = match step {
            Step::GetPages { target } => {
                let report = self.report(target)?;
                self.await_op(async {
                    let pages = report.get_pages().await?;
                    Ok::<Value, EmbedError>(
                        pages
                            .iter()
                            .map(|page| json!({ "name": page.name(), "displayName": page.display_name() }))
                            .collect(),
                    )
                })
            }
            Step::SetPage { target, page } => {
                let report = self.report(target)?;
                self.await_op(async { report.set_page(page).await.map(|()| Value::Null) })
            }
            Step::GetVisuals { target, page } => {
                let page = self.report(target)?.page(page.clone(), None);
                self.await_op(async {
                    let visuals = page.get_visuals().await?;
                    Ok::<Value, EmbedError>(visuals.iter().map(|visual| json!(visual.name())).collect())
                })
            }
            Step::GetFilters {
                target,
                page,
                visual,
            } => return self.filters(target, page.as_deref(), visual.as_deref(), FilterOp::Get),
            Step::SetFilters {
                target,
                page,
                visual,
                filters,
            } => {
                return self.filters(
                    target,
                    page.as_deref(),
                    visual.as_deref(),
                    FilterOp::Set(filters.clone()),
                )
            }
            Step::RemoveFilters {
                target,
                page,
                visual,
            } => return self.filters(target, page.as_deref(), visual.as_deref(), FilterOp::Remove),
            Step::UpdateSettings { target, settings } => {
                let report = self.report(target)?;
                let settings = settings.clone();
                self.await_op(async { report.update_settings(settings).await.map(|()| Value::Null) })
            }
            Step::Print { target } => {
                let report = self.report(target)?;
                self.await_op(async { report.print().await.map(|()| Value::Null) })
            }
            Step::Refresh { target } => {
                let report = self.report(target)?;
                self.await_op(async { report.refresh().await.map(|()| Value::Null) })
            }
            Step::Reload { target } => {
                let instance = self.instance(target)?;
                self.await_op(async { instance.embed().reload().await.map(|()| Value::Null) })
            }
            Step::Fullscreen { target } => {
                let instance = self.instance(target)?;
                instance.embed().fullscreen();
                Ok(fullscreen_state(&instance))
            }
            Step::ExitFullscreen { target } => {
                let instance = self.instance(target)?;
                instance.embed().exit_fullscreen();
                Ok(fullscreen_state(&instance))
            }
            Step::Reset { target } => {
                let instance = self.instance(target)?;
                self.service.reset(instance.embed().element());
                Ok(Value::Null)
            }
            Step::UserChangesPage { target, page } => {
                let raised = self.content.user_changes_page(target, page);
                self.settle();
                Ok(Value::Bool(raised))
            }
            Step::UserSelectsData {
                target,
                page,
                visual,
                data_points,
            } => {
                let raised =
                    self.content
                        .user_selects_data(target, page, visual, data_points.clone());
                self.settle();
                Ok(Value::Bool(raised))
            }
            Step::FailNextApply => {
                self.content.fail_next_apply();
                Ok(Value::Null)
            }
        };
        Ok(result)
    }
}

fn fullscreen_state(instance: &Instance) -> Value {
    instance
        .embed()
        .element()
        .frame()
        .map(|frame| Value::Bool(frame.fullscreen))
        .unwrap_or(Value::Null)
}

/// One-line description of an event for the run log
pub fn describe(event: &EmbedEvent) -> String {
    let mut line = format!("{} {}", event.unique_id, event.name);
    if let Some(page) = &event.page_name {
        line.push_str(&format!(" page={page}"));
    }
    if let Some(visual) = &event.visual_name {
        line.push_str(&format!(" visual={visual}"));
    }
    if let Some(page) = &event.new_page {
        line.push_str(&format!(" newPage={}", page.name()));
    }
    if let Some(initiator) = event.initiator {
        line.push_str(&format!(" initiator={initiator:?}"));
    }
    line
}
