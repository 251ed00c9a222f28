//! # Core Types
//!
//! This crate defines the fundamental types shared by every embedding crate.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Identifiers are typed and cannot be confused.
//! - **Opaque where the wire is opaque**: A unique id is whatever string the
//!   host chose; we never parse it.
//! - **Closed vocabularies are enums**: Content types are a tag, not a string
//!   compared all over the codebase.
//!
//! ## Key Types
//!
//! - [`UniqueId`]: Identifier correlating requests and events with one embedded instance
//! - [`ElementId`]: Identity of a host element that can own an embedded instance
//! - [`EmbedType`]: The kind of hosted content (report, dashboard, tile, Q&A)

pub mod embed_type;
pub mod ids;

pub use embed_type::{EmbedType, UnknownEmbedType};
pub use ids::{ElementId, UniqueId};
