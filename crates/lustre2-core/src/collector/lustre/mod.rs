//! Lustre 2.x server statistics.
//!
//! - `path` - glob pattern expansion and tag extraction from paths
//! - `parser` - lprocfs `stats`, `job_stats` and lnet line grammars
//! - `fields` - statistic to field name tables per group
//! - `group` - compiled pattern groups and grammar selection
//! - `merge` - union of records sharing a tag set
//! - `collector` - the collection cycle

#[allow(clippy::module_inception)]
mod collector;
pub mod fields;
pub mod group;
pub mod merge;
pub mod parser;
pub mod path;

pub use collector::{CollectError, CycleStats, Lustre2Collector};
pub use group::{Grammar, GroupKind, PatternGroup};
pub use merge::RecordMerger;
#[allow(unused_imports)]
pub use parser::ParseError;
pub use path::{PathPattern, PatternError};
