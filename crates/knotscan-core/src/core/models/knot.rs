use phf::phf_map;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Topology class of a closed curve, as reported by an invariant oracle.
///
/// The named variants cover the knot types that actually show up in protein
/// and polymer chains. Anything else an oracle reports (higher knots, composite
/// knots) is kept verbatim in [`KnotType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KnotType {
    Unknot,
    Trefoil,
    FigureEight,
    Cinquefoil,
    ThreeTwist,
    Stevedore,
    SixTwo,
    SixThree,
    /// The oracle gave up, usually because the projection exceeded `max_cross`.
    Unknown,
    Other(String),
}

static KNOT_NAMES: phf::Map<&'static str, KnotType> = phf_map! {
    "0_1" => KnotType::Unknot,
    "3_1" => KnotType::Trefoil,
    "4_1" => KnotType::FigureEight,
    "5_1" => KnotType::Cinquefoil,
    "5_2" => KnotType::ThreeTwist,
    "6_1" => KnotType::Stevedore,
    "6_2" => KnotType::SixTwo,
    "6_3" => KnotType::SixThree,
    "Unknown" => KnotType::Unknown,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Knot type name cannot be empty")]
pub struct ParseKnotTypeError;

impl KnotType {
    #[inline]
    pub fn is_unknot(&self) -> bool {
        matches!(self, KnotType::Unknot)
    }

    #[inline]
    pub fn is_knotted(&self) -> bool {
        !self.is_unknot()
    }

    pub fn as_str(&self) -> &str {
        match self {
            KnotType::Unknot => "0_1",
            KnotType::Trefoil => "3_1",
            KnotType::FigureEight => "4_1",
            KnotType::Cinquefoil => "5_1",
            KnotType::ThreeTwist => "5_2",
            KnotType::Stevedore => "6_1",
            KnotType::SixTwo => "6_2",
            KnotType::SixThree => "6_3",
            KnotType::Unknown => "Unknown",
            KnotType::Other(name) => name,
        }
    }
}

impl FromStr for KnotType {
    type Err = ParseKnotTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(ParseKnotTypeError);
        }
        Ok(KNOT_NAMES
            .get(name)
            .cloned()
            .unwrap_or_else(|| KnotType::Other(name.to_string())))
    }
}

impl fmt::Display for KnotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KnotType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A knot type together with the confidence the oracle assigns to it.
///
/// Deterministic closures always carry a probability of `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyLabel {
    pub knot: KnotType,
    pub probability: f64,
}

impl TopologyLabel {
    pub fn new(knot: KnotType, probability: f64) -> Self {
        Self { knot, probability }
    }

    pub fn unknot() -> Self {
        Self::new(KnotType::Unknot, 0.0)
    }

    /// Whether this label confirms `expected` at the given confidence cutoff.
    #[inline]
    pub fn confirms(&self, expected: &KnotType, cutoff: f64) -> bool {
        &self.knot == expected && self.probability >= cutoff
    }
}
