//! Adapter around the external topological-invariant calculator.
//!
//! The calculator itself is a black box behind [`traits::InvariantOracle`]. The
//! [`adapter`] reduces its raw output to one [`TopologyLabel`] per call, and
//! [`external`] drives a calculator that runs as a separate process.
//!
//! [`TopologyLabel`]: crate::core::models::knot::TopologyLabel

pub mod adapter;
pub mod external;
pub mod traits;

pub use adapter::classify;
pub use traits::{ClosureConfig, ClosureMethod, InvariantOracle, KnotDistribution, OracleError};
