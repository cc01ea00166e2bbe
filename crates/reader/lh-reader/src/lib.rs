//! lh-reader - turns newly appended bytes into events.
//!
//! The read path for one object on one cycle:
//!
//! 1. [`IncrementalFetcher`] range-reads `[offset, size)`
//! 2. [`split_lines`] cuts the bytes into complete lines, carrying the
//!    unterminated tail forward as a fragment
//! 3. [`RecordFilter`] drops comments and blank lines and undoes key escapes
//! 4. a [`RecordParser`] such as [`W3cAccessSchema`] maps columns to an
//!    [`lh_types::Event`]

pub mod fetcher;
pub mod filter;
pub mod schema;
pub mod splitter;

pub use fetcher::{DEFAULT_MAX_FETCH_BYTES, IncrementalFetcher};
pub use filter::{EscapeRule, RecordFilter};
pub use schema::{RecordParser, W3C_ACCESS_SCHEMA, W3cAccessSchema};
pub use splitter::{SplitLines, split_lines};
