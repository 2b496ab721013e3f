//! # Core Models Module
//!
//! Data structures describing chains, trajectories and the knotting events found in them.
//!
//! ## Key Components
//!
//! - [`chain`] - Frames, trajectories and contiguous chain segments
//! - [`knot`] - Knot types and oracle topology labels
//! - [`core_range`] - Knot-core ranges along the chain
//! - [`event`] - Knotting events and their compact/detailed report forms

pub mod chain;
pub mod core_range;
pub mod event;
pub mod knot;
