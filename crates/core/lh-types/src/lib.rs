//! Core types for log-harvester.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`ObjectRef`] - Listing snapshot of one remote log segment
//! - [`Watermark`] - Modification-time boundary of fully processed objects
//! - [`Event`] - Structured, schema-tagged record derived from one log line
//! - [`ResumeState`] - Persisted watermark and per-object offsets

pub mod checkpoint;
pub mod event;
pub mod object;
pub mod watermark;

pub use checkpoint::*;
pub use event::*;
pub use object::*;
pub use watermark::*;
