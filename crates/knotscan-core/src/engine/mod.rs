//! # Engine Module
//!
//! The stateful layer of the analysis: configuration, the per-run context that
//! memoizes oracle answers, and the individual pipeline stages.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Detection thresholds, closure and localizer settings
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error taxonomy
//! - **Tasks** ([`tasks`]) - Scanner, validator, filters, core assignment and classifier
//!
//! Whole-frame oracle calls are independent of each other and run on the rayon pool
//! when the `parallel` feature is enabled. Decisions that depend on frame order
//! always consume results in frame order, so the output does not depend on scheduling.

pub(crate) mod cache;
pub mod config;
pub(crate) mod context;
pub mod error;
pub mod progress;
pub(crate) mod tasks;
#[cfg(test)]
pub(crate) mod testing;
