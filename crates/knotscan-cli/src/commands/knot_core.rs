use super::{atom_selection, emit};
use crate::cli::CoreArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use knotscan::core::io::loader::load_structure;
use knotscan::workflows::knot_core;
use tracing::info;

pub fn run(args: CoreArgs) -> Result<()> {
    let partial = PartialConfig::load(args.config.as_deref())?;
    let settings = partial.merge_with_core(&args)?;

    info!("Loading structure from {:?}", &args.input);
    let structure = load_structure(&args.input, &atom_selection(&args.selection)).map_err(
        |source| CliError::Load {
            path: args.input.clone(),
            source,
        },
    )?;

    let oracle = settings.oracle.build();
    let core = knot_core::run(&structure, &oracle, &settings.config)?;

    let json = serde_json::to_string(&core).map_err(|e| CliError::Other(e.into()))?;
    emit(None, &json)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::commands::fixtures::pdb_trajectory;
    use clap::Parser;

    fn core_args(input: &str, script: &str) -> CoreArgs {
        let argv = [
            "knotscan",
            "core",
            "-i",
            input,
            "--oracle",
            "/bin/sh",
            "--oracle-arg",
            "-c",
            "--oracle-arg",
            script,
            "--oracle-arg",
            "oracle",
        ];
        match Cli::parse_from(argv).command {
            Commands::Core(args) => args,
            _ => panic!("Expected 'core' subcommand"),
        }
    }

    #[test]
    fn unknotted_structure_has_no_core() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.pdb");
        std::fs::write(&input, pdb_trajectory(1, 12)).unwrap();

        let args = core_args(input.to_str().unwrap(), "echo 0_1");
        assert!(run(args).is_ok());
    }

    #[test]
    fn unsupported_extension_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("model.gro");
        std::fs::write(&input, "").unwrap();

        let args = core_args(input.to_str().unwrap(), "echo 0_1");
        assert!(matches!(run(args), Err(CliError::Load { .. })));
    }
}
