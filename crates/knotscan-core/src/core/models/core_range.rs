use serde::{Serialize, Serializer};
use std::fmt;

/// Shortest accepted knot core: `end - begin` must exceed this.
pub const MIN_CORE_SPAN: usize = 6;

/// Inclusive range of chain indices that still carries the knot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KnotCore {
    pub begin: usize,
    pub end: usize,
}

impl KnotCore {
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end, "knot core begin must not exceed end");
        Self { begin, end }
    }

    #[inline]
    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// Degenerate cores (too short to hold a knot) are treated as absent.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.begin <= self.end && self.span() > MIN_CORE_SPAN
    }

    pub fn contains(&self, other: &KnotCore) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }
}

impl From<(usize, usize)> for KnotCore {
    fn from((begin, end): (usize, usize)) -> Self {
        Self::new(begin, end)
    }
}

impl fmt::Display for KnotCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.begin, self.end)
    }
}

impl Serialize for KnotCore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.begin, self.end).serialize(serializer)
    }
}

/// Knot-core range of one event, sampled at one frame of its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSample {
    pub event_frame: usize,
    pub frame: usize,
    pub core: Option<KnotCore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_requires_span_above_six() {
        assert!(!KnotCore::new(10, 16).is_valid());
        assert!(KnotCore::new(10, 17).is_valid());
        assert!(!KnotCore::new(5, 5).is_valid());
    }

    #[test]
    fn containment_is_inclusive() {
        let outer = KnotCore::new(10, 80);
        assert!(outer.contains(&KnotCore::new(10, 80)));
        assert!(outer.contains(&KnotCore::new(12, 70)));
        assert!(!outer.contains(&KnotCore::new(9, 70)));
    }

    #[test]
    fn serializes_as_pair() {
        let json = serde_json::to_string(&KnotCore::new(9, 87)).unwrap();
        assert_eq!(json, "[9,87]");
    }
}
