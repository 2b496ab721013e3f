use crate::core::models::chain::ChainSegment;
use crate::core::models::core_range::KnotCore;
use crate::core::models::knot::{KnotType, TopologyLabel};
use crate::core::oracle::adapter;
use crate::core::oracle::traits::{ClosureConfig, InvariantOracle, OracleError};
use crate::engine::config::LocalizerConfig;
use tracing::{debug, trace};

/// Trimming stops this many positions short of the opposite end.
const MIN_TRIM_DISTANCE: usize = 5;
/// Backoff accepts a range confirmed with this fraction of the cutoff.
const BACKOFF_CUTOFF_FACTOR: f64 = 0.8;

enum Side {
    Left,
    Right,
}

struct Trimmer<'s, 'a> {
    oracle: &'s dyn InvariantOracle,
    segment: &'s ChainSegment<'a>,
    closure: &'s ClosureConfig,
    main: KnotType,
    last: usize,
}

impl Trimmer<'_, '_> {
    fn label(&self, cut_beg: usize, cut_end: usize) -> Result<TopologyLabel, OracleError> {
        let sub = self.segment.slice(cut_beg, self.last - cut_end);
        adapter::classify(self.oracle, &sub, self.closure)
    }

    fn confirms(&self, label: &TopologyLabel, cutoff: f64) -> bool {
        label.confirms(&self.main, cutoff)
    }

    /// Greedy trim from one end, tolerating up to `gap` consecutive misses.
    fn trim(&self, side: Side, config: &LocalizerConfig) -> Result<usize, OracleError> {
        let mut cut = 0;
        let mut misses = 0;
        let mut confirming = true;
        while cut + MIN_TRIM_DISTANCE < self.last && (confirming || misses <= config.gap) {
            cut += 1;
            let label = match side {
                Side::Left => self.label(cut, 0)?,
                Side::Right => self.label(0, cut)?,
            };
            confirming = self.confirms(&label, config.cutoff);
            if confirming {
                misses = 0;
            } else {
                misses += 1;
            }
        }
        Ok(cut)
    }
}

/// Finds the shortest sub-chain of `segment` that still carries its knot.
///
/// Returns `None` when the whole segment is unknotted or its label falls below
/// `cutoff`. The result is in chain indices of the segment.
///
/// The search trims each end greedily, then backs both trims off together until the
/// trimmed range confirms the knot again with at least `0.8 * cutoff`. If no backoff
/// step confirms, the whole segment is returned.
pub fn locate(
    oracle: &dyn InvariantOracle,
    segment: &ChainSegment<'_>,
    closure: &ClosureConfig,
    config: &LocalizerConfig,
) -> Result<Option<KnotCore>, OracleError> {
    if segment.len() < 2 {
        return Ok(None);
    }
    let full = adapter::classify(oracle, segment, closure)?;
    if full.knot.is_unknot() || full.probability < config.cutoff {
        trace!(
            first = segment.first_index,
            knot = %full.knot,
            probability = full.probability,
            "No knot to localize."
        );
        return Ok(None);
    }

    let trimmer = Trimmer {
        oracle,
        segment,
        closure,
        main: full.knot,
        last: segment.len() - 1,
    };

    let mut cut_beg = trimmer.trim(Side::Left, config)?;
    let mut cut_end = trimmer.trim(Side::Right, config)?;
    debug!(cut_beg, cut_end, "Greedy trims found.");

    let backoff_cutoff = BACKOFF_CUTOFF_FACTOR * config.cutoff;
    while cut_beg + cut_end > 0 {
        if cut_beg + cut_end <= trimmer.last {
            let label = trimmer.label(cut_beg, cut_end)?;
            if trimmer.confirms(&label, backoff_cutoff) {
                break;
            }
        }
        cut_beg = cut_beg.saturating_sub(1);
        cut_end = cut_end.saturating_sub(1);
    }

    let core = KnotCore::new(
        segment.first_index + cut_beg,
        segment.first_index + trimmer.last - cut_end,
    );
    debug!(core = %core, "Knot core located.");
    Ok(Some(core))
}
