use crate::core::models::core_range::ProfileSample;
use crate::core::models::event::KnotEvent;
use crate::engine::context::AnalysisContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use itertools::Itertools;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Frames right after formation that are sampled one by one.
const DENSE_FRAMES: usize = 10;
/// Sparse sampling starts this far after formation.
const SPARSE_OFFSET: usize = 110;

/// Frames at which the core of `event` is sampled.
///
/// Every frame from formation to formation + 10, then every `step` frames from
/// formation + 110 up to (excluding) the event end. The last trajectory frame is added
/// for the last event if it persists.
pub fn sample_frames(event: &KnotEvent, max_frame: usize, step: usize, is_last: bool) -> Vec<usize> {
    let start = event.formation_frame;
    let end = event.end_frame(max_frame);
    let dense = (start..=start + DENSE_FRAMES).filter(|&f| f <= max_frame);
    let sparse = (start + SPARSE_OFFSET..end).step_by(step.max(1));
    let tail = (is_last && event.unknotting_frame.is_none()).then_some(max_frame);

    dense.chain(sparse).chain(tail).sorted().dedup().collect()
}

/// Knot-core profile of every event over its lifetime.
#[instrument(skip_all, name = "profile_task")]
pub fn run(
    context: &AnalysisContext,
    events: &[KnotEvent],
    step: usize,
) -> Result<Vec<ProfileSample>, EngineError> {
    let max_frame = context.max_frame();
    let jobs: Vec<(usize, usize)> = events
        .iter()
        .enumerate()
        .flat_map(|(i, event)| {
            sample_frames(event, max_frame, step, i + 1 == events.len())
                .into_iter()
                .map(move |frame| (event.formation_frame, frame))
        })
        .collect();

    context.reporter.report(Progress::TaskStart {
        total_steps: jobs.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = jobs.iter();

    #[cfg(feature = "parallel")]
    let iterator = jobs.par_iter();

    let samples = iterator
        .map(|&(event_frame, frame)| {
            let core = context.locate_core(frame)?;
            context.reporter.report(Progress::TaskIncrement);
            Ok(ProfileSample {
                event_frame,
                frame,
                core,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;
    context.reporter.report(Progress::TaskFinish);

    info!(samples = samples.len(), "Knot-core profile computed.");
    Ok(samples)
}
