//! # Core Module
//!
//! Stateless building blocks for knot analysis of chain trajectories.
//!
//! ## Architecture
//!
//! - **Chain and Event Representation** ([`models`]) - Frames, trajectories, knot types,
//!   knot-core ranges and knotting events
//! - **Invariant Oracle** ([`oracle`]) - The seam to the external knot-invariant calculator
//!   and the reduction of its output to topology labels
//! - **File I/O** ([`io`]) - Structure and trajectory readers, the indexed-xyz scratch
//!   format, and knot-core profile export
//!
//! Nothing in this module computes knot invariants; every topology question is
//! answered by an [`oracle::InvariantOracle`] implementation.

pub mod io;
pub mod models;
pub mod oracle;
