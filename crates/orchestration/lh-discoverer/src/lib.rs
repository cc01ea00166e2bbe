//! lh-discoverer - discovery side of log-harvester.
//!
//! This crate decides *what* to read on a poll cycle:
//!
//! - [`PrefixPlanner`] picks the narrowest set of time-bucketed prefixes to list
//! - [`ObjectScanner`] lists them and produces a deduplicated, time-ordered
//!   candidate list of objects modified after the watermark
//! - [`filter`] holds the watermark and key-pattern filters
//! - [`S3Store`] and [`MemoryStore`] implement [`lh_traits::ObjectStore`]
//!
//! # Example
//!
//! ```ignore
//! use lh_discoverer::{ObjectScanner, PrefixPlanner, S3Config, S3Store};
//! use std::sync::Arc;
//!
//! let store = Arc::new(S3Store::from_config(&S3Config::new("logs")).await?);
//! let planner = PrefixPlanner::new("app");
//! let scanner = ObjectScanner::new(store);
//!
//! let prefixes = planner.plan(watermark, chrono::Utc::now());
//! let scan = scanner.scan(&prefixes, watermark).await?;
//! eprintln!("{} candidates", scan.candidates.len());
//! ```

pub mod filter;
pub mod memory;
pub mod planner;
pub mod s3;
pub mod scanner;

pub use filter::{Filter, PatternFilter, WatermarkFilter, parse_date};
pub use memory::MemoryStore;
pub use planner::{DEFAULT_LOOKBACK_DAYS, PrefixPlanner};
pub use s3::{RetryConfig, S3Config, S3Store, create_s3_client, parse_s3_uri};
pub use scanner::{DEFAULT_REQUEST_TIMEOUT, ObjectScanner, ScanResult};
