//! # Scenario Files
//!
//! A scenario describes a host document and a list of steps to run against
//! the instances embedded in it.
//!
//! ## Format
//!
//! ```json
//! {
//!   "accessToken": "demo-token",
//!   "elements": [
//!     { "attributes": { "powerbi-embed-url": "https://app.example/reportEmbed?reportId=R1",
//!                       "powerbi-type": "report", "powerbi-name": "sales" } }
//!   ],
//!   "steps": [
//!     { "op": "getPages", "target": "sales" },
//!     { "op": "setPage", "target": "sales", "page": "ReportSection2" }
//!   ]
//! }
//! ```
//!
//! Steps name their instance by unique id (`target`).

use host_dom::FakeElement;
use ipc::{Filter, SettingsPatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

/// Scenario bundled with the binary
pub const DEMO: &str = include_str!("../scenarios/demo.json");

/// Scenario error types
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Step {index} ({op}): a visual needs a page")]
    VisualWithoutPage { index: usize, op: &'static str },
}

/// One element of the host document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl ElementSpec {
    /// Builds the element and its subtree
    pub fn build(&self) -> Rc<FakeElement> {
        let element = self
            .attributes
            .iter()
            .fold(FakeElement::new(self.tag.clone()), |element, (name, value)| {
                element.with_attribute(name.clone(), value.clone())
            })
            .shared();
        for child in &self.children {
            element.append_child(child.build());
        }
        element
    }
}

/// A scripted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    GetPages {
        target: String,
    },
    SetPage {
        target: String,
        page: String,
    },
    GetVisuals {
        target: String,
        page: String,
    },
    GetFilters {
        target: String,
        page: Option<String>,
        visual: Option<String>,
    },
    SetFilters {
        target: String,
        page: Option<String>,
        visual: Option<String>,
        filters: Vec<Filter>,
    },
    RemoveFilters {
        target: String,
        page: Option<String>,
        visual: Option<String>,
    },
    UpdateSettings {
        target: String,
        settings: SettingsPatch,
    },
    Print {
        target: String,
    },
    Refresh {
        target: String,
    },
    Reload {
        target: String,
    },
    Fullscreen {
        target: String,
    },
    ExitFullscreen {
        target: String,
    },
    Reset {
        target: String,
    },
    /// The content's own UI switches page
    UserChangesPage {
        target: String,
        page: String,
    },
    /// The content's own UI selects data points
    UserSelectsData {
        target: String,
        page: String,
        visual: String,
        #[serde(default, rename = "dataPoints")]
        data_points: Value,
    },
    /// The content fails the next change it accepts
    FailNextApply,
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::GetPages { .. } => "getPages",
            Step::SetPage { .. } => "setPage",
            Step::GetVisuals { .. } => "getVisuals",
            Step::GetFilters { .. } => "getFilters",
            Step::SetFilters { .. } => "setFilters",
            Step::RemoveFilters { .. } => "removeFilters",
            Step::UpdateSettings { .. } => "updateSettings",
            Step::Print { .. } => "print",
            Step::Refresh { .. } => "refresh",
            Step::Reload { .. } => "reload",
            Step::Fullscreen { .. } => "fullscreen",
            Step::ExitFullscreen { .. } => "exitFullscreen",
            Step::Reset { .. } => "reset",
            Step::UserChangesPage { .. } => "userChangesPage",
            Step::UserSelectsData { .. } => "userSelectsData",
            Step::FailNextApply => "failNextApply",
        }
    }

    /// Unique id of the instance the step acts on
    pub fn target(&self) -> Option<&str> {
        match self {
            Step::GetPages { target }
            | Step::SetPage { target, .. }
            | Step::GetVisuals { target, .. }
            | Step::GetFilters { target, .. }
            | Step::SetFilters { target, .. }
            | Step::RemoveFilters { target, .. }
            | Step::UpdateSettings { target, .. }
            | Step::Print { target }
            | Step::Refresh { target }
            | Step::Reload { target }
            | Step::Fullscreen { target }
            | Step::ExitFullscreen { target }
            | Step::Reset { target }
            | Step::UserChangesPage { target, .. }
            | Step::UserSelectsData { target, .. } => Some(target),
            Step::FailNextApply => None,
        }
    }
}

/// A parsed scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Service-wide default access token
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub log_messages: bool,
    pub elements: Vec<ElementSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn parse(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.check()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn demo() -> Result<Self, ScenarioError> {
        Self::parse(DEMO)
    }

    /// Host document holding every element
    pub fn build_document(&self) -> Rc<FakeElement> {
        let document = FakeElement::new("body").shared();
        for element in &self.elements {
            document.append_child(element.build());
        }
        document
    }

    fn check(&self) -> Result<(), ScenarioError> {
        for (index, step) in self.steps.iter().enumerate() {
            let visual_without_page = matches!(
                step,
                Step::GetFilters { page: None, visual: Some(_), .. }
                    | Step::SetFilters { page: None, visual: Some(_), .. }
                    | Step::RemoveFilters { page: None, visual: Some(_), .. }
            );
            if visual_without_page {
                return Err(ScenarioError::VisualWithoutPage {
                    index,
                    op: step.op(),
                });
            }
        }
        Ok(())
    }
}
