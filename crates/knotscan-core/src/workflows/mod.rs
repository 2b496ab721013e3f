//! High-level entry points.
//!
//! - [`analyze`] runs the full trajectory pipeline: scan, validate, filter, locate
//!   knot cores and classify events.
//! - [`knot_core`] computes the knot core of a single structure.

pub mod analyze;
pub mod knot_core;
