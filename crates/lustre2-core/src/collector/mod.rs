//! Lustre statistics collector.
//!
//! This module walks the Lustre `/proc` and debugfs trees, parses the
//! statistics files found there and merges them into one record per target,
//! client export or job. Filesystem access goes through a trait so the whole
//! pipeline runs against mock trees in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Lustre2Collector                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │  ost group   │  │  mds group   │  │  lnet group  │ workers│
//! │  │  obdfilter/* │  │  mdt/*       │  │  lnet/stats  │        │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘        │
//! │         └─────────────────┼─────────────────┘                │
//! │                    ┌──────▼──────┐                           │
//! │                    │RecordMerger │ ──► MetricSink            │
//! │                    └─────────────┘                           │
//! │                    ┌─────────────┐                           │
//! │                    │  FileSystem │ (trait)                   │
//! │                    └──────┬──────┘                           │
//! └───────────────────────────┼──────────────────────────────────┘
//!                             │
//!             ┌───────────────┼───────────────┐
//!             │               │               │
//!      ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!      │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!      │  (Linux)    │ │ (Testing)   │ │ (Fixtures)  │
//!      └─────────────┘ └─────────────┘ └─────────────┘
//! ```

pub mod lustre;
pub mod mock;
pub mod traits;

#[allow(unused_imports)]
pub use lustre::{CollectError, CycleStats, Lustre2Collector};
pub use mock::MockFs;
pub use traits::{FileSystem, RealFs};
