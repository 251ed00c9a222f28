//! # Embed Components
//!
//! This crate implements the embedded instances and the nodes inside them.
//!
//! ## Philosophy
//!
//! - **Addressed operations**: every operation is a verb, a path built from
//!   the node hierarchy and the instance's `{uid}`
//! - **Remote errors pass through**: a rejected operation fails with the
//!   body the content sent, whether validation or apply rejected it
//! - **Additive event sets**: each content type declares the events it adds
//!   to a shared base set
//!
//! ## Architecture
//!
//! - [`Embed`]: state, configuration and subscriptions of one instance
//! - [`Report`], [`Dashboard`], [`Tile`], [`Qna`]: typed views over an [`Embed`]
//! - [`Page`], [`Visual`]: value objects scoping operations inside a report
//! - [`Instance`]: the tagged variant the registry stores

pub mod content;
pub mod embed;
pub mod error;
pub mod events;
pub mod node;
pub mod report;

pub use content::{Dashboard, Qna, Tile};
pub use embed::{Embed, EmbedParts, EmbedState};
pub use error::EmbedError;
pub use events::{EmbedEvent, EventHandler, EventScope, Initiator, SubscriptionRegistry};
pub use node::{Filterable, Node};
pub use report::{Page, Report, Visual};

use core_types::EmbedType;

/// Builds an instance of one content type
pub type Constructor = fn(EmbedParts) -> Instance;

/// Constructor for each known content type
pub fn constructor_for(embed_type: EmbedType) -> Constructor {
    match embed_type {
        EmbedType::Report => Report::create,
        EmbedType::Dashboard => Dashboard::create,
        EmbedType::Tile => Tile::create,
        EmbedType::Qna => Qna::create,
    }
}

/// An embedded instance of any content type
#[derive(Clone, Debug)]
pub enum Instance {
    Report(Report),
    Dashboard(Dashboard),
    Tile(Tile),
    Qna(Qna),
}

impl Instance {
    pub fn embed(&self) -> &Embed {
        match self {
            Instance::Report(report) => report.embed(),
            Instance::Dashboard(dashboard) => dashboard.embed(),
            Instance::Tile(tile) => tile.embed(),
            Instance::Qna(qna) => qna.embed(),
        }
    }

    pub fn embed_type(&self) -> EmbedType {
        self.embed().embed_type()
    }

    pub fn as_report(&self) -> Option<&Report> {
        match self {
            Instance::Report(report) => Some(report),
            _ => None,
        }
    }

    pub fn as_dashboard(&self) -> Option<&Dashboard> {
        match self {
            Instance::Dashboard(dashboard) => Some(dashboard),
            _ => None,
        }
    }

    /// Checks if both values refer to the same instance
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.embed().ptr_eq(other.embed())
    }
}
