//! Reading chain coordinates from structure and trajectory files, and writing
//! analysis by-products.
//!
//! Supported inputs are PDB (single structures and multi-model trajectories), XYZ
//! trajectories paired with a PDB topology, and the indexed-xyz format used both for
//! single structures and as the scratch format handed to invariant calculators.

pub mod loader;
pub mod nxyz;
pub mod pdb;
pub mod profile;
pub mod xyz;

pub use loader::{AtomSelection, LoadError, ParseErrorKind, Structure};
