//! # knotscan
//!
//! Detection, localization and classification of knot formation in molecular dynamics
//! trajectories of linear polymers and proteins.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless models (`Trajectory`, `KnotEvent`,
//!   `KnotCore`), the [`InvariantOracle`](core::oracle::InvariantOracle) seam to the
//!   external knot-invariant calculator, and file I/O.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the analysis context with its
//!   frame-label cache, and the pipeline stages (multi-resolution scanner, event
//!   validator, duration filter, core assignment, classifier).
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the engine:
//!   trajectory analysis and single-structure knot-core computation.
//!
//! The library never computes knot invariants itself. Every topology question goes
//! through an `InvariantOracle`, typically an
//! [`ExternalOracle`](core::oracle::external::ExternalOracle) wrapping a calculator program.

pub mod core;
pub mod engine;
pub mod workflows;
