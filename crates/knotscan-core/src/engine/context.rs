use super::cache::FrameLabelCache;
use super::config::AnalysisConfig;
use super::error::EngineError;
use super::progress::ProgressReporter;
use super::tasks::knot_core;
use crate::core::models::chain::{ChainSegment, Frame, Trajectory};
use crate::core::models::core_range::KnotCore;
use crate::core::models::knot::KnotType;
use crate::core::oracle::adapter;
use crate::core::oracle::traits::InvariantOracle;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Everything a pipeline stage needs to query the trajectory.
///
/// The context owns the frame-label cache; stages borrow it and never mutate the
/// trajectory or configuration.
pub struct AnalysisContext<'a> {
    pub trajectory: &'a Trajectory,
    pub oracle: &'a dyn InvariantOracle,
    pub config: &'a AnalysisConfig,
    pub reporter: &'a ProgressReporter<'a>,
    cache: FrameLabelCache,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        trajectory: &'a Trajectory,
        oracle: &'a dyn InvariantOracle,
        config: &'a AnalysisConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            trajectory,
            oracle,
            config,
            reporter,
            cache: FrameLabelCache::new(),
        }
    }

    #[inline]
    pub fn max_frame(&self) -> usize {
        self.trajectory.max_frame()
    }

    #[inline]
    pub fn last_residue(&self) -> usize {
        self.trajectory.last_residue()
    }

    fn frame(&self, index: usize) -> Result<&'a Frame, EngineError> {
        self.trajectory
            .frame(index)
            .ok_or(EngineError::FrameOutOfRange {
                frame: index,
                max_frame: self.max_frame(),
            })
    }

    /// Frames `start..=end`, clipped to the trajectory.
    pub fn window(&self, start: usize, end: usize) -> Vec<usize> {
        let end = end.min(self.max_frame());
        if start > end {
            return Vec::new();
        }
        (start..=end).collect()
    }

    /// Knot type of a whole frame, sampled at the configured stride.
    pub fn frame_label(&self, index: usize) -> Result<KnotType, EngineError> {
        if let Some(knot) = self.cache.get(index) {
            return Ok(knot);
        }
        let frame = self.frame(index)?;
        let points = frame.strided(self.config.detection.scan_stride);
        let knot = adapter::knot_type(
            self.oracle,
            &ChainSegment::whole(&points),
            &self.config.closure,
        )
        .map_err(|e| EngineError::oracle(index, e))?;
        trace!(frame = index, knot = %knot, "Frame classified.");
        self.cache.insert(index, knot.clone());
        Ok(knot)
    }

    /// Labels for several frames, in the order given.
    pub fn frame_labels(&self, frames: &[usize]) -> Result<Vec<KnotType>, EngineError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = frames.iter();

        #[cfg(feature = "parallel")]
        let iterator = frames.par_iter();

        iterator.map(|&frame| self.frame_label(frame)).collect()
    }

    /// Number of knotted frames among `frames`.
    pub fn knotted_count(&self, frames: &[usize]) -> Result<usize, EngineError> {
        Ok(self
            .frame_labels(frames)?
            .iter()
            .filter(|knot| knot.is_knotted())
            .count())
    }

    /// First frame of `frames` (in order) that is unknotted, if any.
    pub fn first_unknotted(&self, frames: &[usize]) -> Result<Option<usize>, EngineError> {
        let labels = self.frame_labels(frames)?;
        Ok(frames
            .iter()
            .zip(&labels)
            .find(|(_, knot)| knot.is_unknot())
            .map(|(frame, _)| *frame))
    }

    /// Knot core of a whole frame at full resolution.
    pub fn locate_core(&self, index: usize) -> Result<Option<KnotCore>, EngineError> {
        let frame = self.frame(index)?;
        knot_core::locate(
            self.oracle,
            &frame.segment(),
            &self.config.closure,
            &self.config.localizer,
        )
        .map_err(|e| EngineError::oracle(index, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::chain::Terminus;
    use crate::engine::config::AnalysisConfigBuilder;
    use crate::engine::testing::{SyntheticOracle, synthetic_trajectory};

    #[test]
    fn repeated_labels_reach_the_oracle_once() {
        let trajectory = synthetic_trajectory(30, 40);
        let oracle = SyntheticOracle::new(KnotType::Trefoil, 10..20, (5, 30));
        let config = AnalysisConfigBuilder::new()
            .terminus(Terminus::N)
            .build()
            .unwrap();
        let reporter = ProgressReporter::new();
        let context = AnalysisContext::new(&trajectory, &oracle, &config, &reporter);

        let frames = context.window(8, 12);
        assert_eq!(context.knotted_count(&frames).unwrap(), 3);
        assert_eq!(context.knotted_count(&frames).unwrap(), 3);
        assert_eq!(oracle.calls(), 5);
        assert_eq!(context.first_unknotted(&context.window(12, 25)).unwrap(), Some(20));
    }

    #[test]
    fn window_is_clipped_to_the_last_frame() {
        let trajectory = synthetic_trajectory(10, 20);
        let oracle = SyntheticOracle::new(KnotType::Trefoil, 0..0, (5, 15));
        let config = AnalysisConfigBuilder::new()
            .terminus(Terminus::N)
            .build()
            .unwrap();
        let reporter = ProgressReporter::new();
        let context = AnalysisContext::new(&trajectory, &oracle, &config, &reporter);

        assert_eq!(context.window(7, 15), vec![7, 8, 9]);
        assert!(context.window(12, 15).is_empty());
        assert!(matches!(
            context.frame_label(10),
            Err(EngineError::FrameOutOfRange { frame: 10, .. })
        ));
    }
}
