//! Deterministic stand-ins for the invariant calculator and trajectories, for tests.

use crate::core::models::chain::{ChainSegment, Frame, Trajectory};
use crate::core::models::knot::KnotType;
use crate::core::oracle::traits::{ClosureConfig, InvariantOracle, KnotDistribution, OracleError};
use nalgebra::Point3;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Points of frame `f` sit at `(f, i, 0)`, so an oracle can recover both the frame
/// and the chain positions a segment covers from the coordinates alone.
pub fn synthetic_trajectory(frames: usize, points: usize) -> Trajectory {
    let frames = (0..frames)
        .map(|f| {
            Frame::new(
                (0..points)
                    .map(|i| Point3::new(f as f64, i as f64, 0.0))
                    .collect(),
            )
        })
        .collect();
    Trajectory::new(frames).expect("synthetic trajectory is well-formed")
}

pub fn straight_chain(points: usize) -> Vec<Point3<f64>> {
    (0..points)
        .map(|i| Point3::new(0.0, i as f64, 0.0))
        .collect()
}

/// Oracle for [`synthetic_trajectory`] frames.
///
/// A segment is knotted iff its frame lies in one of the knotted ranges, is not a
/// flicker frame, and the segment spans the configured core (first position at or
/// before the core begin, last position at or after the core end).
pub struct SyntheticOracle {
    knot: KnotType,
    knotted: Vec<Range<usize>>,
    core: (usize, usize),
    flicker: HashSet<usize>,
    fail_on: Option<usize>,
    calls: AtomicUsize,
}

impl SyntheticOracle {
    pub fn new(knot: KnotType, frames: Range<usize>, core: (usize, usize)) -> Self {
        Self {
            knot,
            knotted: vec![frames],
            core,
            flicker: HashSet::new(),
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_range(mut self, frames: Range<usize>) -> Self {
        self.knotted.push(frames);
        self
    }

    /// Frames that read as unknotted even inside a knotted range.
    pub fn with_flicker<I: IntoIterator<Item = usize>>(mut self, frames: I) -> Self {
        self.flicker.extend(frames);
        self
    }

    pub fn failing_on(mut self, frame: usize) -> Self {
        self.fail_on = Some(frame);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InvariantOracle for SyntheticOracle {
    fn identify(
        &self,
        segment: &ChainSegment<'_>,
        _closure: &ClosureConfig,
    ) -> Result<KnotDistribution, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (Some(first), Some(last)) = (segment.points.first(), segment.points.last()) else {
            return Ok(KnotDistribution::single(KnotType::Unknot));
        };
        let frame = first.x.round() as usize;
        if self.fail_on == Some(frame) {
            return Err(OracleError::Calculation(format!("synthetic failure on frame {}", frame)));
        }

        let (begin, end) = (first.y.round() as usize, last.y.round() as usize);
        let knotted = self.knotted.iter().any(|r| r.contains(&frame))
            && !self.flicker.contains(&frame)
            && begin <= self.core.0
            && end >= self.core.1;
        Ok(KnotDistribution::single(if knotted {
            self.knot.clone()
        } else {
            KnotType::Unknot
        }))
    }
}
