use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrajectoryError {
    #[error("Trajectory contains no frames")]
    Empty,
    #[error("Frame {frame} has {found} points, expected {expected}")]
    InconsistentLength {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("Chain has {0} points; at least 2 are required")]
    ChainTooShort(usize),
}

/// Which chain end threads through the loop when the knot forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminus {
    N,
    C,
}

/// A contiguous run of chain points, remembering the chain index of its first point.
#[derive(Debug, Clone, Copy)]
pub struct ChainSegment<'a> {
    pub points: &'a [Point3<f64>],
    pub first_index: usize,
}

impl<'a> ChainSegment<'a> {
    pub fn new(points: &'a [Point3<f64>], first_index: usize) -> Self {
        Self {
            points,
            first_index,
        }
    }

    pub fn whole(points: &'a [Point3<f64>]) -> Self {
        Self::new(points, 0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Chain index of the last point.
    #[inline]
    pub fn last_index(&self) -> usize {
        self.first_index + self.points.len().saturating_sub(1)
    }

    /// The sub-segment between two positions of this segment, both inclusive.
    ///
    /// Positions are relative to the segment, not chain indices.
    pub fn slice(&self, begin: usize, end: usize) -> ChainSegment<'a> {
        let end = end.min(self.points.len().saturating_sub(1));
        let begin = begin.min(end);
        ChainSegment {
            points: &self.points[begin..=end],
            first_index: self.first_index + begin,
        }
    }
}

/// One trajectory snapshot: the chain's coordinates at a single timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    points: Vec<Point3<f64>>,
}

impl Frame {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn segment(&self) -> ChainSegment<'_> {
        ChainSegment::whole(&self.points)
    }

    /// Every `stride`-th point, starting with the first.
    pub fn strided(&self, stride: usize) -> Vec<Point3<f64>> {
        self.points.iter().step_by(stride.max(1)).copied().collect()
    }
}

/// An ordered, immutable sequence of frames sharing one chain length.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    frames: Vec<Frame>,
}

impl Trajectory {
    pub fn new(frames: Vec<Frame>) -> Result<Self, TrajectoryError> {
        let first = frames.first().ok_or(TrajectoryError::Empty)?;
        let expected = first.len();
        if expected < 2 {
            return Err(TrajectoryError::ChainTooShort(expected));
        }
        if let Some((frame, found)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.len() != expected)
            .map(|(i, f)| (i, f.len()))
        {
            return Err(TrajectoryError::InconsistentLength {
                frame,
                expected,
                found,
            });
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the last frame.
    pub fn max_frame(&self) -> usize {
        self.frames.len() - 1
    }

    /// Number of points per frame.
    pub fn chain_len(&self) -> usize {
        self.frames[0].len()
    }

    /// Chain index of the last residue, used for tail-length measurements.
    pub fn last_residue(&self) -> usize {
        self.chain_len() - 1
    }
}
