use crate::core::models::knot::KnotType;
use crate::engine::context::AnalysisContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const COARSE_STEP: usize = 100;
const MEDIUM_STEP: usize = 10;
const FINE_STEP: usize = 1;

/// Medium refinement covers `[f - 90, f - 10)` below a coarse hit `f`.
const MEDIUM_LOOKBACK: (usize, usize) = (90, 10);
/// Fine refinement covers `[f - 9, f - 1)` below a medium hit `f`.
const FINE_LOOKBACK: (usize, usize) = (9, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Unknotted to knotted.
    Knotting,
    /// Knotted to unknotted.
    Unknotting,
}

impl Transition {
    /// `previous` is `None` at the first frame of a pass.
    fn is_change(self, previous: Option<&KnotType>, current: &KnotType, frame: usize) -> bool {
        match self {
            Transition::Knotting => current.is_knotted() && previous.is_none_or(KnotType::is_unknot),
            Transition::Unknotting => {
                frame != 0 && current.is_unknot() && previous.is_none_or(KnotType::is_knotted)
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Transition::Knotting => "knotting",
            Transition::Unknotting => "unknotting",
        }
    }
}

fn stepped(start: usize, end: usize, step: usize) -> Vec<usize> {
    (start..end).step_by(step).collect()
}

/// All transitions at the coarse step over the whole trajectory.
///
/// An off-grid last frame is scanned as well, so a transition after the last
/// multiple of the step is not lost.
fn coarse_pass(context: &AnalysisContext, kind: Transition) -> Result<Vec<usize>, EngineError> {
    let mut frames = stepped(0, context.trajectory.len(), COARSE_STEP);
    let max_frame = context.max_frame();
    if max_frame % COARSE_STEP != 0 {
        frames.push(max_frame);
    }
    let labels = context.frame_labels(&frames)?;

    let mut found = Vec::new();
    let mut previous: Option<&KnotType> = None;
    for (&frame, label) in frames.iter().zip(&labels) {
        if kind.is_change(previous, label, frame) {
            found.push(frame);
        }
        previous = Some(label);
    }
    Ok(found)
}

/// First transition in `[start, end)` at `step`, scanning in frame order.
fn first_change(
    context: &AnalysisContext,
    kind: Transition,
    start: usize,
    end: usize,
    step: usize,
) -> Result<Option<usize>, EngineError> {
    let mut previous: Option<KnotType> = None;
    for frame in stepped(start, end, step) {
        let label = context.frame_label(frame)?;
        if kind.is_change(previous.as_ref(), &label, frame) {
            return Ok(Some(frame));
        }
        previous = Some(label);
    }
    Ok(None)
}

/// Narrows one coarse hit down to a single frame.
///
/// A medium window that holds no transition resolves to its end frame; an empty
/// window (near the trajectory start) keeps the coarse hit.
fn refine(context: &AnalysisContext, kind: Transition, coarse: usize) -> Result<usize, EngineError> {
    let start = coarse.saturating_sub(MEDIUM_LOOKBACK.0);
    let end = coarse.saturating_sub(MEDIUM_LOOKBACK.1);
    let medium = if start < end {
        first_change(context, kind, start, end, MEDIUM_STEP)?.unwrap_or(end)
    } else {
        coarse
    };

    let start = medium.saturating_sub(FINE_LOOKBACK.0);
    let end = medium.saturating_sub(FINE_LOOKBACK.1);
    let fine = first_change(context, kind, start, end, FINE_STEP)?.unwrap_or(medium);

    debug!(kind = kind.name(), coarse, medium, fine, "Candidate refined.");
    Ok(fine)
}

/// Candidate frames for one kind of transition, in ascending order of their coarse hit.
///
/// Each coarse hit is refined independently; the refinement of a single hit is
/// sequential because it stops at the first transition.
#[instrument(skip_all, name = "scan_task", fields(kind = kind.name()))]
pub fn run(context: &AnalysisContext, kind: Transition) -> Result<Vec<usize>, EngineError> {
    let coarse = coarse_pass(context, kind)?;
    debug!(candidates = ?coarse, "Coarse pass finished.");

    context.reporter.report(Progress::TaskStart {
        total_steps: coarse.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = coarse.iter();

    #[cfg(feature = "parallel")]
    let iterator = coarse.par_iter();

    let refined = iterator
        .map(|&frame| {
            let result = refine(context, kind, frame);
            context.reporter.report(Progress::TaskIncrement);
            result
        })
        .collect::<Result<Vec<_>, _>>()?;

    context.reporter.report(Progress::TaskFinish);
    info!(candidates = ?refined, "Scan finished.");
    Ok(refined)
}
