//! Pipeline stages of the trajectory analysis.
//!
//! Each stage consumes the previous stage's output and returns a new, owned result;
//! no stage mutates shared state. The stages run in the order
//! [`scan`] → [`validation`] → [`filter`] → [`core_assignment`] → [`classify`], with
//! [`profile`] as an optional follow-up. [`knot_core`] is the localizer primitive used
//! by core assignment, profiling and the single-structure workflow.

pub mod classify;
pub mod core_assignment;
pub mod filter;
pub mod knot_core;
pub mod profile;
pub mod scan;
pub mod validation;
