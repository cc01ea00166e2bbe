//! Collaborator traits for log-harvester.
//!
//! The harvest engine never talks to a concrete backend. It consumes:
//! - [`ObjectStore`] - list-by-prefix and range reads against the log bucket
//! - [`EventSink`] - downstream delivery of finished events
//! - [`CheckpointStore`] - durable load/save of the resume position
//!
//! [`with_deadline`] bounds a single store call so a stuck request surfaces as
//! a transient timeout instead of blocking the loop.

pub mod checkpoint;
pub mod deadline;
pub mod sink;
pub mod store;

pub use checkpoint::*;
pub use deadline::with_deadline;
pub use sink::*;
pub use store::*;
