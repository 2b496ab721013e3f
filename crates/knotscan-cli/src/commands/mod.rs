pub mod analyze;
pub mod knot_core;

use crate::cli::SelectionArgs;
use crate::error::{CliError, Result};
use knotscan::core::io::AtomSelection;
use std::path::Path;

/// Atom selection from the command line; empty lists fall back to the defaults.
pub fn atom_selection(args: &SelectionArgs) -> AtomSelection {
    let defaults = AtomSelection::default();
    AtomSelection {
        chains: (!args.chains.is_empty()).then(|| args.chains.clone()),
        atoms: if args.atoms.is_empty() {
            defaults.atoms
        } else {
            args.atoms.clone()
        },
    }
}

/// Writes `text` to `path`, or to standard output without one.
pub fn emit(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{}\n", text)).map_err(|e| CliError::Output {
            path: path.to_path_buf(),
            source: e.into(),
        }),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}
