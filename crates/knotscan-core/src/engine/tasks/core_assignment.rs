use crate::core::models::core_range::KnotCore;
use crate::core::models::event::KnotEvent;
use crate::engine::context::AnalysisContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Frames after the formation frame searched for a usable core.
const CORE_PROBE_FRAMES: usize = 9;

fn valid_core(context: &AnalysisContext, frame: usize) -> Result<Option<KnotCore>, EngineError> {
    Ok(context.locate_core(frame)?.filter(KnotCore::is_valid))
}

fn assign(context: &AnalysisContext, event: KnotEvent) -> Result<KnotEvent, EngineError> {
    let frame = event.formation_frame;
    if let Some(core) = valid_core(context, frame)? {
        return Ok(event.with_core(Some(core)));
    }

    debug!(frame, "Degenerate core at formation frame, probing forward.");
    let last = (frame + CORE_PROBE_FRAMES).min(context.max_frame());
    for probe in frame + 1..=last {
        if let Some(core) = valid_core(context, probe)? {
            debug!(from = frame, to = probe, core = %core, "Event re-keyed.");
            return Ok(event.rekeyed(probe).with_core(Some(core)));
        }
    }

    warn!(frame, "No valid knot core found near the formation frame.");
    Ok(event.with_core(None))
}

/// Attaches the knot core at each event's formation frame.
///
/// An event whose core is missing or too short is moved to the first of the next
/// frames with a valid core. Events are returned sorted by (possibly new) frame.
#[instrument(skip_all, name = "core_assignment_task")]
pub fn run(context: &AnalysisContext, events: Vec<KnotEvent>) -> Result<Vec<KnotEvent>, EngineError> {
    context.reporter.report(Progress::TaskStart {
        total_steps: events.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = events.into_iter();

    #[cfg(feature = "parallel")]
    let iterator = events.into_par_iter();

    let mut assigned = iterator
        .map(|event| {
            let result = assign(context, event);
            context.reporter.report(Progress::TaskIncrement);
            result
        })
        .collect::<Result<Vec<_>, _>>()?;
    context.reporter.report(Progress::TaskFinish);

    assigned.sort_by_key(|e| e.formation_frame);
    assigned.dedup_by_key(|e| e.formation_frame);

    info!(
        events = assigned.len(),
        without_core = assigned.iter().filter(|e| e.core.is_none()).count(),
        "Knot cores assigned."
    );
    Ok(assigned)
}
