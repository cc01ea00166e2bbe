//! Object filtering for discovery.
//!
//! Filters decide which listed objects become harvest candidates:
//! - [`WatermarkFilter`] drops objects already covered by the watermark
//! - [`PatternFilter`] matches the object's file name against a glob

mod date;
mod pattern;

pub use date::{WatermarkFilter, parse_date};
pub use pattern::PatternFilter;

use lh_types::ObjectRef;

/// Trait for object filters.
pub trait Filter: Send + Sync {
    /// Returns true if the object should be kept.
    fn matches(&self, obj: &ObjectRef) -> bool;

    /// Short description for logging.
    fn description(&self) -> String;
}
