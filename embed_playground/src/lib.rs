//! # Embed Playground
//!
//! This crate drives a scripted embedding session: a host document is
//! embedded against simulated content and a list of steps is run against
//! the resulting instances.
//!
//! ## Philosophy
//!
//! - **Everything in one process**: host and content windows are a loopback pair
//! - **Scenarios are data**: documents and steps come from JSON
//! - **Deterministic**: background work only runs when the runtime settles
//!
//! ## Non-Responsibilities
//!
//! The playground does NOT:
//! - Render anything; the frame is a value on a fake element
//! - Talk to a real content service

pub mod runtime;
pub mod scenario;

pub use runtime::{PlaygroundError, PlaygroundRuntime, RunSummary, StepOutcome};
pub use scenario::{ElementSpec, Scenario, ScenarioError, Step};
