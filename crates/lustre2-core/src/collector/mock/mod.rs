//! Mock filesystem implementations for testing.
//!
//! This module provides `MockFs` and pre-built Lustre server scenarios for
//! testing the collector without a mounted Lustre filesystem.

mod filesystem;
pub mod scenarios;

pub use filesystem::MockFs;
