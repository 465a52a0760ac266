//! # gardener-core
//!
//! Core types for Gardener, an autonomous loop that invents small projects,
//! asks generation services for one file at a time, and commits the result
//! under a daily quota.
//!
//! ## Core paradigm
//!
//! - The loop engine is the single writer of all persisted state
//! - Every component reports through one event channel, never panics the loop
//! - Failures of external services are values (`None`/`false`), not errors

mod config;
mod error;
mod extract;
mod types;

pub use config::GardenerConfig;
pub use error::{GardenerError, Result};
pub use extract::{extract_json, strip_code_fences};
pub use types::*;
