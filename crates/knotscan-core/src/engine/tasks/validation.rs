use crate::core::models::event::KnotEvent;
use crate::engine::context::AnalysisContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Fraction of the pre-history window that must be unknotted.
const PC_KNOTTING: f64 = 0.8;
/// Fraction of the post-unknotting window that must be unknotted.
const PC_UNKNOTTING: f64 = 0.5;
/// Length of the windows that confirm an unknotting frame.
const CHECK_LEN: usize = 10;
/// Forward jump between successive unknotting confirmation windows.
const UNKNOTTING_PROBE_STEP: usize = 11;
const MAX_REPAIR_ITERATIONS: usize = 10;

/// A knotting candidate and the unknotting candidate it is paired with.
///
/// The id ties both halves together so that discarding a knotting candidate drops
/// exactly its own unknotting frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    pub id: usize,
    pub knotting: usize,
    pub unknotting: Option<usize>,
}

/// Pairs knotting with unknotting candidates, reconciling lists of different lengths.
///
/// An unknotting candidate preceding the first knotting candidate means the chain
/// starts knotted, so frame 0 is added as a knotting candidate. A knotting candidate
/// after the last unknotting candidate persists to the end of the trajectory.
pub fn pair_candidates(knotting: &[usize], unknotting: &[usize]) -> Vec<CandidatePair> {
    let mut knotting = knotting.to_vec();
    let mut unknotting: Vec<Option<usize>> = unknotting.iter().copied().map(Some).collect();

    if knotting.is_empty() {
        return Vec::new();
    }
    if knotting.len() != unknotting.len() {
        if knotting.len() == 1 && unknotting.is_empty() {
            unknotting.push(None);
        } else {
            if let (Some(Some(first_un)), Some(&first_kn)) = (unknotting.first(), knotting.first()) {
                if *first_un < first_kn {
                    knotting.insert(0, 0);
                }
            }
            let last_un = unknotting.last().copied().flatten();
            if let Some(&last_kn) = knotting.last() {
                if last_un.is_none_or(|u| last_kn > u) {
                    unknotting.push(None);
                }
            }
        }
    }

    knotting
        .into_iter()
        .enumerate()
        .map(|(id, knotting)| CandidatePair {
            id,
            knotting,
            unknotting: unknotting.get(id).copied().flatten(),
        })
        .collect()
}

/// At most `floor((1 - fraction) * len)` knotted frames are tolerated.
fn tolerated_knotted(fraction: f64, len: usize) -> usize {
    ((1.0 - fraction) * len as f64 + 1e-9).floor() as usize
}

/// Whether the `min_gap` frames before `frame` were mostly unknotted.
pub fn pre_history_ok(context: &AnalysisContext, frame: usize) -> Result<bool, EngineError> {
    let min_gap = context.config.detection.min_gap;
    let window = match frame.checked_sub(1) {
        Some(end) => context.window(frame.saturating_sub(min_gap), end),
        None => Vec::new(),
    };
    let knotted = context.knotted_count(&window)?;
    Ok(knotted <= tolerated_knotted(PC_KNOTTING, min_gap))
}

/// First unknotted frame among the `scope` frames after `frame`, if any.
fn post_history_failure(context: &AnalysisContext, frame: usize) -> Result<Option<usize>, EngineError> {
    let scope = context.config.detection.scope;
    context.first_unknotted(&context.window(frame + 1, frame + scope))
}

/// Bounded forward search for a stable knotting frame after a failed post-history check.
fn repair(context: &AnalysisContext, mut failure: usize) -> Result<Option<usize>, EngineError> {
    for attempt in 0..MAX_REPAIR_ITERATIONS {
        let probe = failure + 1;
        if probe > context.max_frame() {
            break;
        }
        if context.frame_label(probe)?.is_unknot() {
            debug!(attempt, probe, "Repair probe is unknotted.");
            failure += 2;
            continue;
        }
        match post_history_failure(context, probe)? {
            None => return Ok(Some(probe)),
            Some(next) => {
                debug!(attempt, probe, next, "Repair probe failed the forward check.");
                failure = next;
            }
        }
    }
    Ok(None)
}

/// Confirms one knotting candidate, returning the (possibly repaired) formation frame.
fn confirm_knotting(context: &AnalysisContext, candidate: usize) -> Result<Option<usize>, EngineError> {
    if !pre_history_ok(context, candidate)? {
        debug!(candidate, "Discarded: knotted too often before the candidate.");
        return Ok(None);
    }
    match post_history_failure(context, candidate)? {
        None => Ok(Some(candidate)),
        Some(failure) => {
            let repaired = repair(context, failure)?;
            match repaired {
                Some(frame) => debug!(candidate, frame, "Candidate repaired."),
                None => debug!(candidate, "Discarded: repair exhausted."),
            }
            Ok(repaired)
        }
    }
}

fn mostly_unknotted(context: &AnalysisContext, window: &[usize]) -> Result<bool, EngineError> {
    Ok(context.knotted_count(window)? <= tolerated_knotted(PC_UNKNOTTING, CHECK_LEN))
}

/// Confirms that the chain stays untied after `frame`, probing further windows if the
/// first one fails. The returned frame is always the candidate itself.
fn confirm_unknotting(context: &AnalysisContext, frame: usize) -> Result<Option<usize>, EngineError> {
    if mostly_unknotted(context, &context.window(frame + 1, frame + CHECK_LEN))? {
        return Ok(Some(frame));
    }
    let mut next = frame + UNKNOTTING_PROBE_STEP;
    while next + CHECK_LEN < context.max_frame() {
        if mostly_unknotted(context, &context.window(next, next + CHECK_LEN - 1))? {
            debug!(frame, window_start = next, "Unknotting confirmed by a later window.");
            return Ok(Some(frame));
        }
        next += UNKNOTTING_PROBE_STEP;
    }
    debug!(frame, "Unknotting candidate not confirmed.");
    Ok(None)
}

fn build_event(context: &AnalysisContext, pair: &CandidatePair) -> Result<Option<KnotEvent>, EngineError> {
    let Some(formation) = confirm_knotting(context, pair.knotting)? else {
        return Ok(None);
    };
    let knot_type = context.frame_label(formation)?;
    let unknotting = match pair.unknotting {
        Some(frame) => confirm_unknotting(context, frame)?,
        None => None,
    };
    debug!(
        candidate = pair.id,
        formation,
        knot = %knot_type,
        unknotting = ?unknotting,
        "Tentative event built."
    );
    Ok(Some(KnotEvent::tentative(formation, knot_type, unknotting)))
}

/// Turns scanner candidates into tentative events, ordered by formation frame.
///
/// Candidates that fail validation are dropped together with their paired
/// unknotting frame. Two candidates repaired onto the same frame yield one event.
#[instrument(skip_all, name = "validation_task")]
pub fn run(
    context: &AnalysisContext,
    knotting: &[usize],
    unknotting: &[usize],
) -> Result<Vec<KnotEvent>, EngineError> {
    let pairs = pair_candidates(knotting, unknotting);
    info!(pairs = pairs.len(), "Validating knotting candidates.");
    context.reporter.report(Progress::TaskStart {
        total_steps: pairs.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = pairs.iter();

    #[cfg(feature = "parallel")]
    let iterator = pairs.par_iter();

    let built = iterator
        .map(|pair| {
            let event = build_event(context, pair);
            context.reporter.report(Progress::TaskIncrement);
            event
        })
        .collect::<Result<Vec<_>, _>>()?;
    context.reporter.report(Progress::TaskFinish);

    let mut events: Vec<KnotEvent> = built.into_iter().flatten().collect();
    events.sort_by_key(|e| e.formation_frame);
    events.dedup_by_key(|e| e.formation_frame);

    if let Some((_, earlier)) = events.split_last() {
        for event in earlier.iter().filter(|e| e.unknotting_frame.is_none()) {
            warn!(
                frame = event.formation_frame,
                "Event is not the last one but has no unknotting frame; treating it as persisting."
            );
        }
    }

    info!(
        candidates = pairs.len(),
        events = events.len(),
        "Validation finished."
    );
    Ok(events)
}
