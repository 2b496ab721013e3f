use super::{atom_selection, emit};
use crate::cli::AnalyzeArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use knotscan::core::io::loader::load_trajectory;
use knotscan::core::io::profile;
use knotscan::engine::progress::ProgressReporter;
use knotscan::workflows::analyze::{self, AnalysisOptions, AnalysisReport};
use std::fs::File;
use std::io::BufWriter;
use tracing::{info, warn};

pub fn run(args: AnalyzeArgs, show_progress: bool) -> Result<()> {
    let partial = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial.merge_with_analyze(&args)?;

    info!("Loading trajectory from {:?}", &args.input);
    let trajectory = load_trajectory(
        &args.input,
        args.topology.as_deref(),
        &atom_selection(&args.selection),
    )
    .map_err(|source| CliError::Load {
        path: args.input.clone(),
        source,
    })?;

    let progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let oracle = settings.oracle.build();
    let options = AnalysisOptions {
        profile_step: settings.profile_step,
    };

    info!("Invoking the trajectory analysis workflow...");
    let outcome = analyze::run(&trajectory, &oracle, &settings.config, &options, &reporter)?;

    match &outcome {
        Some(report) => info!(events = report.events.len(), "Analysis finished."),
        None => info!("Analysis finished: no knot forms in this trajectory."),
    }

    let rendered = outcome.as_ref().map(AnalysisReport::report);
    let json = serde_json::to_string_pretty(&rendered).map_err(|e| CliError::Other(e.into()))?;
    emit(args.output.as_deref(), &json)?;

    if let Some(path) = &args.profile {
        match outcome.as_ref().and_then(|report| report.profile.as_ref()) {
            Some(samples) => {
                info!(samples = samples.len(), "Writing knot-core profile to {:?}", path);
                let file = File::create(path).map_err(|e| CliError::Output {
                    path: path.clone(),
                    source: e.into(),
                })?;
                profile::write_csv(samples, BufWriter::new(file)).map_err(|e| {
                    CliError::Output {
                        path: path.clone(),
                        source: e.into(),
                    }
                })?;
            }
            None => warn!("No knot detected; knot-core profile {:?} was not written.", path),
        }
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::commands::fixtures::pdb_trajectory;
    use clap::Parser;
    use std::path::Path;

    fn analyze_args(trajectory: &Path, output: &Path, extra: &[&str]) -> AnalyzeArgs {
        let mut argv = vec![
            "knotscan".to_string(),
            "analyze".to_string(),
            "-i".to_string(),
            trajectory.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
            "--terminus".to_string(),
            "n".to_string(),
            "--oracle".to_string(),
            "/bin/sh".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(argv).command {
            Commands::Analyze(args) => args,
            _ => panic!("Expected 'analyze' subcommand"),
        }
    }

    #[test]
    fn unknotted_trajectory_reports_null() {
        let dir = tempfile::tempdir().unwrap();
        let trajectory = dir.path().join("traj.pdb");
        let output = dir.path().join("report.json");
        let profile = dir.path().join("profile.csv");
        std::fs::write(&trajectory, pdb_trajectory(3, 8)).unwrap();

        let args = analyze_args(
            &trajectory,
            &output,
            &[
                "--oracle-arg",
                "-c",
                "--oracle-arg",
                "echo 0_1",
                "--oracle-arg",
                "oracle",
                "--profile",
                profile.to_str().unwrap(),
            ],
        );
        run(args, false).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap().trim(), "null");
        assert!(!profile.exists());
    }

    #[test]
    fn failing_oracle_aborts_the_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let trajectory = dir.path().join("traj.pdb");
        let output = dir.path().join("report.json");
        std::fs::write(&trajectory, pdb_trajectory(3, 8)).unwrap();

        let args = analyze_args(
            &trajectory,
            &output,
            &["--oracle-arg", "-c", "--oracle-arg", "exit 2"],
        );
        assert!(matches!(run(args, false), Err(CliError::Engine(_))));
        assert!(!output.exists());
    }

    #[test]
    fn xyz_without_topology_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let trajectory = dir.path().join("traj.xyz");
        let output = dir.path().join("report.json");
        std::fs::write(&trajectory, "2\n\nC 0 0 0\nC 1 0 0\n").unwrap();

        let args = analyze_args(&trajectory, &output, &[]);
        assert!(matches!(run(args, false), Err(CliError::Load { .. })));
    }
}
