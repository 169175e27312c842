//! lustre2-core - collection of Lustre 2.x server statistics.
//!
//! Provides:
//! - `collector` - pattern expansion, file grammars, merging and the collection cycle
//! - `config` - the per-group pattern lists
//! - `model` - tag and field sets of a record
//! - `sink` - destinations for finished records

pub mod collector;
pub mod config;
pub mod model;
pub mod sink;
