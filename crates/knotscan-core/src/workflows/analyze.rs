use crate::core::models::chain::Trajectory;
use crate::core::models::core_range::ProfileSample;
use crate::core::models::event::{KnotEvent, KnotReport, OutputFormat};
use crate::core::oracle::traits::InvariantOracle;
use crate::engine::config::AnalysisConfig;
use crate::engine::context::AnalysisContext;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::{self, scan::Transition};
use tracing::{info, instrument};

/// Confirmed knotting events of one trajectory, ordered by formation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub events: Vec<KnotEvent>,
    pub format: OutputFormat,
    /// Knot-core samples over each event's lifetime, when requested.
    pub profile: Option<Vec<ProfileSample>>,
}

impl AnalysisReport {
    pub fn report(&self) -> KnotReport {
        KnotReport::from_events(&self.events, self.format)
    }
}

/// Options that do not change the detected events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisOptions {
    /// Sample the knot core over each event's lifetime every `n` frames.
    pub profile_step: Option<usize>,
}

/// Detects, localizes and classifies knotting events in a trajectory.
///
/// Returns `Ok(None)` when no knot ever forms. An event whose knot core cannot be
/// located is still reported, with its core, mechanism and loop behavior left empty.
///
/// # Errors
///
/// Any oracle failure aborts the analysis and is returned as [`EngineError::Oracle`].
#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    trajectory: &Trajectory,
    oracle: &dyn InvariantOracle,
    config: &AnalysisConfig,
    options: &AnalysisOptions,
    reporter: &ProgressReporter,
) -> Result<Option<AnalysisReport>, EngineError> {
    info!(
        frames = trajectory.len(),
        chain_length = trajectory.chain_len(),
        terminus = ?config.terminus,
        closure = %config.closure.method,
        "Starting trajectory analysis."
    );
    let context = AnalysisContext::new(trajectory, oracle, config, reporter);

    // === Phase 1: Coarse-to-fine scan ===
    let (knotting, unknotting) = reporter.phase("Scanning", || {
        let knotting = tasks::scan::run(&context, Transition::Knotting)?;
        let unknotting = tasks::scan::run(&context, Transition::Unknotting)?;
        Ok::<_, EngineError>((knotting, unknotting))
    })?;

    if knotting.is_empty() {
        info!("No knotting transition found.");
        reporter.report(Progress::Message("No knot detected.".to_string()));
        return Ok(None);
    }

    // === Phase 2: Validation ===
    let events = reporter.phase("Validating", || {
        tasks::validation::run(&context, &knotting, &unknotting)
    })?;

    // === Phase 3: Duration filter ===
    let events = tasks::filter::run(
        events,
        config.detection.min_knot,
        context.max_frame(),
    );

    // === Phase 4: Knot cores ===
    let events = reporter.phase("Locating knot cores", || {
        tasks::core_assignment::run(&context, events)
    })?;

    // === Phase 5: Classification ===
    let events = tasks::classify::run(
        events,
        config.terminus,
        context.last_residue(),
        config.reference_core.as_ref(),
    );

    // === Phase 6: Optional core profile ===
    let profile = match options.profile_step {
        Some(step) => Some(reporter.phase("Profiling knot cores", || {
            tasks::profile::run(&context, &events, step)
        })?),
        None => None,
    };

    info!(events = events.len(), "Trajectory analysis complete.");
    Ok(Some(AnalysisReport {
        events,
        format: config.output,
        profile,
    }))
}
