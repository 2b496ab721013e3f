use super::traits::{ClosureConfig, InvariantOracle, KnotDistribution, OracleError};
use crate::core::models::chain::ChainSegment;
use crate::core::models::knot::{KnotType, TopologyLabel};
use tracing::trace;

/// Classifies a chain segment, reducing the oracle's distribution to a single label.
///
/// Deterministic closures yield the leading type with confidence `1.0`. Stochastic
/// closures yield the leading type with its empirical frequency; a tie for the lead
/// is reported as the unknot with probability `0.0`.
///
/// # Errors
///
/// Oracle failures are returned unchanged; they are never retried here.
pub fn classify(
    oracle: &dyn InvariantOracle,
    segment: &ChainSegment<'_>,
    closure: &ClosureConfig,
) -> Result<TopologyLabel, OracleError> {
    let distribution = oracle.identify(segment, closure)?;
    let label = reduce(&distribution, closure.method.is_stochastic());
    trace!(
        first = segment.first_index,
        last = segment.last_index(),
        knot = %label.knot,
        probability = label.probability,
        "Segment classified."
    );
    Ok(label)
}

fn reduce(distribution: &KnotDistribution, stochastic: bool) -> TopologyLabel {
    let total = distribution.total();
    if distribution.is_empty() || total <= 0.0 {
        return TopologyLabel::unknot();
    }

    let best = distribution
        .entries()
        .iter()
        .map(|(_, w)| *w)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut leaders = distribution.entries().iter().filter(|(_, w)| *w == best);

    let (knot, weight) = match (leaders.next(), leaders.next()) {
        (Some((knot, weight)), None) => (knot.clone(), *weight),
        _ => return TopologyLabel::unknot(),
    };

    if stochastic {
        TopologyLabel::new(knot, weight / total)
    } else {
        TopologyLabel::new(knot, 1.0)
    }
}

/// Whole-chain knot type, ignoring confidence.
pub fn knot_type(
    oracle: &dyn InvariantOracle,
    segment: &ChainSegment<'_>,
    closure: &ClosureConfig,
) -> Result<KnotType, OracleError> {
    classify(oracle, segment, closure).map(|label| label.knot)
}
