use crate::core::models::event::KnotEvent;
use tracing::{debug, info, instrument};

/// Drops events that last fewer than `min_knot` frames.
///
/// Persisting events last until `max_frame`.
#[instrument(skip_all, name = "duration_filter_task")]
pub fn run(events: Vec<KnotEvent>, min_knot: usize, max_frame: usize) -> Vec<KnotEvent> {
    let before = events.len();
    let kept: Vec<KnotEvent> = events
        .into_iter()
        .filter(|event| {
            let duration = event.duration(max_frame);
            let keep = duration >= min_knot;
            if !keep {
                debug!(
                    frame = event.formation_frame,
                    duration, min_knot, "Event too short, removed."
                );
            }
            keep
        })
        .collect();
    info!(before, after = kept.len(), "Duration filter applied.");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::knot::KnotType;

    #[test]
    fn span_of_exactly_min_knot_is_kept() {
        let short = KnotEvent::tentative(100, KnotType::Trefoil, Some(199));
        let exact = KnotEvent::tentative(300, KnotType::Trefoil, Some(400));
        let kept = run(vec![short, exact.clone()], 100, 999);
        assert_eq!(kept, vec![exact]);
    }

    #[test]
    fn persisting_events_run_to_the_last_frame() {
        let late = KnotEvent::tentative(950, KnotType::Trefoil, None);
        let early = KnotEvent::tentative(800, KnotType::Trefoil, None);
        let kept = run(vec![early.clone(), late], 100, 999);
        assert_eq!(kept, vec![early]);
    }
}
