use crate::core::models::chain::Terminus;
use crate::core::models::core_range::KnotCore;
use crate::core::models::event::{FormationMechanism, KnotEvent, LoopBehavior};
use tracing::{debug, instrument};

/// Chains shorter than this use the small slipknot threshold.
const LONG_CHAIN: usize = 100;
const SLIPKNOT_TAIL_SHORT_CHAIN: usize = 5;
const SLIPKNOT_TAIL_LONG_CHAIN: usize = 10;

const TIGHTENS_BELOW: f64 = 0.5;
const EXPANDS_ABOVE: f64 = 1.5;

pub fn slipknot_threshold(prot_len: usize) -> usize {
    if prot_len < LONG_CHAIN {
        SLIPKNOT_TAIL_SHORT_CHAIN
    } else {
        SLIPKNOT_TAIL_LONG_CHAIN
    }
}

/// Length of the chain beyond the core on the threading side.
fn tail(core: &KnotCore, terminus: Terminus, prot_len: usize) -> usize {
    match terminus {
        Terminus::N => core.begin,
        Terminus::C => prot_len.saturating_sub(core.end),
    }
}

pub fn mechanism(core: &KnotCore, terminus: Terminus, prot_len: usize) -> FormationMechanism {
    if tail(core, terminus, prot_len) >= slipknot_threshold(prot_len) {
        FormationMechanism::Slipknot
    } else {
        FormationMechanism::Direct
    }
}

/// Rates the loop against the reference core.
///
/// For an N-terminal threading end the ratio compares the C-side tails, and vice versa.
pub fn loop_behavior(
    core: &KnotCore,
    reference: &KnotCore,
    terminus: Terminus,
    prot_len: usize,
) -> LoopBehavior {
    let (current, native) = match terminus {
        Terminus::N => (
            prot_len.saturating_sub(core.end),
            prot_len.saturating_sub(reference.end),
        ),
        Terminus::C => (core.begin, reference.begin),
    };
    let ratio = match native {
        0 if current == 0 => 1.0,
        0 => f64::INFINITY,
        _ => current as f64 / native as f64,
    };

    if ratio < TIGHTENS_BELOW {
        LoopBehavior::Tightens
    } else if ratio <= EXPANDS_ABOVE {
        LoopBehavior::InPlace
    } else {
        LoopBehavior::Expands
    }
}

/// Labels the formation mechanism and, given a reference core, the loop behavior of
/// every event that has a core. Events without a core pass through unchanged.
#[instrument(skip_all, name = "classification_task")]
pub fn run(
    events: Vec<KnotEvent>,
    terminus: Terminus,
    prot_len: usize,
    reference: Option<&KnotCore>,
) -> Vec<KnotEvent> {
    if reference.is_none() {
        debug!("No reference core given; loop behavior is not rated.");
    }
    events
        .into_iter()
        .map(|event| match event.core {
            Some(core) => {
                let mechanism = mechanism(&core, terminus, prot_len);
                let loop_behavior = reference.map(|r| loop_behavior(&core, r, terminus, prot_len));
                debug!(
                    frame = event.formation_frame,
                    ?mechanism,
                    ?loop_behavior,
                    "Event classified."
                );
                KnotEvent {
                    mechanism: Some(mechanism),
                    loop_behavior,
                    ..event
                }
            }
            None => event,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::knot::KnotType;

    #[test]
    fn threshold_depends_on_chain_length() {
        assert_eq!(slipknot_threshold(99), 5);
        assert_eq!(slipknot_threshold(100), 10);
    }

    #[test]
    fn tail_at_threshold_is_a_slipknot() {
        let core = KnotCore::new(10, 80);
        assert_eq!(mechanism(&core, Terminus::N, 199), FormationMechanism::Slipknot);
        assert_eq!(
            mechanism(&KnotCore::new(9, 80), Terminus::N, 199),
            FormationMechanism::Direct
        );
        assert_eq!(mechanism(&core, Terminus::C, 85), FormationMechanism::Slipknot);
        assert_eq!(mechanism(&core, Terminus::C, 84), FormationMechanism::Direct);
    }

    #[test]
    fn loop_ratio_of_one_third_above_reference_is_in_place() {
        let behavior = loop_behavior(
            &KnotCore::new(10, 40),
            &KnotCore::new(10, 80),
            Terminus::N,
            200,
        );
        assert_eq!(behavior, LoopBehavior::InPlace);
    }

    #[test]
    fn loop_ratio_extremes() {
        let reference = KnotCore::new(20, 100);
        assert_eq!(
            loop_behavior(&KnotCore::new(5, 90), &reference, Terminus::C, 200),
            LoopBehavior::Tightens
        );
        assert_eq!(
            loop_behavior(&KnotCore::new(40, 120), &reference, Terminus::C, 200),
            LoopBehavior::Expands
        );
        assert_eq!(
            loop_behavior(&KnotCore::new(30, 120), &reference, Terminus::C, 200),
            LoopBehavior::InPlace
        );
    }

    #[test]
    fn events_without_core_are_left_alone() {
        let bare = KnotEvent::tentative(10, KnotType::Trefoil, None);
        let cored = bare.clone().rekeyed(20).with_core(Some(KnotCore::new(10, 80)));
        let out = run(
            vec![bare.clone(), cored],
            Terminus::N,
            199,
            Some(&KnotCore::new(10, 80)),
        );
        assert_eq!(out[0], bare);
        assert_eq!(out[1].mechanism, Some(FormationMechanism::Slipknot));
        assert_eq!(out[1].loop_behavior, Some(LoopBehavior::InPlace));
    }
}
