use crate::core::models::chain::ChainSegment;
use crate::core::models::knot::KnotType;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Failed to launch invariant calculator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Invariant calculator exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Invariant calculator did not finish within {after:?}")]
    Timeout { after: Duration },
    #[error("Unreadable calculator output on line {line}: {message}")]
    Protocol { line: usize, message: String },
    #[error("Scratch file error: {0}")]
    Scratch(#[from] io::Error),
    #[error("Failed to collect invariant calculator output: {0}")]
    Pipe(#[source] io::Error),
    #[error("Invariant calculation failed: {0}")]
    Calculation(String),
}

/// Geometric procedure used to close an open chain before computing its invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClosureMethod {
    Closed,
    #[default]
    MassCenter,
    TwoPoints,
    OnePoint,
    Rays,
    Dependent,
    Direction,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown closure method '{0}'")]
pub struct ParseClosureMethodError(pub String);

impl ClosureMethod {
    pub fn code(self) -> u8 {
        match self {
            ClosureMethod::Closed => 0,
            ClosureMethod::MassCenter => 1,
            ClosureMethod::TwoPoints => 2,
            ClosureMethod::OnePoint => 3,
            ClosureMethod::Rays => 4,
            ClosureMethod::Dependent => 5,
            ClosureMethod::Direction => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ClosureMethod::Closed),
            1 => Some(ClosureMethod::MassCenter),
            2 => Some(ClosureMethod::TwoPoints),
            3 => Some(ClosureMethod::OnePoint),
            4 => Some(ClosureMethod::Rays),
            5 => Some(ClosureMethod::Dependent),
            6 => Some(ClosureMethod::Direction),
            _ => None,
        }
    }

    /// Stochastic closures sample random closing arcs and need several tries.
    pub fn is_stochastic(self) -> bool {
        !matches!(self, ClosureMethod::Closed | ClosureMethod::MassCenter)
    }
}

impl FromStr for ClosureMethod {
    type Err = ParseClosureMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['_', ' '], "-");
        if let Ok(code) = name.parse::<u8>() {
            return Self::from_code(code).ok_or(ParseClosureMethodError(s.to_string()));
        }
        match name.as_str() {
            "closed" => Ok(ClosureMethod::Closed),
            "mass-center" => Ok(ClosureMethod::MassCenter),
            "two-points" => Ok(ClosureMethod::TwoPoints),
            "one-point" => Ok(ClosureMethod::OnePoint),
            "rays" => Ok(ClosureMethod::Rays),
            "dependent" => Ok(ClosureMethod::Dependent),
            "direction" => Ok(ClosureMethod::Direction),
            _ => Err(ParseClosureMethodError(s.to_string())),
        }
    }
}

impl fmt::Display for ClosureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClosureMethod::Closed => "closed",
            ClosureMethod::MassCenter => "mass-center",
            ClosureMethod::TwoPoints => "two-points",
            ClosureMethod::OnePoint => "one-point",
            ClosureMethod::Rays => "rays",
            ClosureMethod::Dependent => "dependent",
            ClosureMethod::Direction => "direction",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosureConfig {
    pub method: ClosureMethod,
    /// Number of closures sampled by stochastic methods.
    pub tries: u32,
    /// Maximal crossing count after reduction at which the polynomial is still computed.
    pub max_cross: u32,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            method: ClosureMethod::MassCenter,
            tries: 20,
            max_cross: 15,
        }
    }
}

/// Weighted knot types returned by one oracle call.
///
/// Weights are either raw counts over closure tries or probabilities; only their
/// relative size matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnotDistribution {
    entries: Vec<(KnotType, f64)>,
}

impl KnotDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(knot: KnotType) -> Self {
        let mut dist = Self::new();
        dist.add(knot, 1.0);
        dist
    }

    /// Tallies one knot type per closure try.
    pub fn from_tries<I: IntoIterator<Item = KnotType>>(tries: I) -> Self {
        let mut dist = Self::new();
        for knot in tries {
            dist.add(knot, 1.0);
        }
        dist
    }

    pub fn add(&mut self, knot: KnotType, weight: f64) {
        match self.entries.iter_mut().find(|(k, _)| *k == knot) {
            Some((_, w)) => *w += weight,
            None => self.entries.push((knot, weight)),
        }
    }

    pub fn entries(&self) -> &[(KnotType, f64)] {
        &self.entries
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// External knot-invariant calculator.
///
/// Implementations close the given segment with the configured method and report
/// the resulting knot types. Calls for different segments must be independent;
/// they may run concurrently.
pub trait InvariantOracle: Send + Sync {
    fn identify(
        &self,
        segment: &ChainSegment<'_>,
        closure: &ClosureConfig,
    ) -> Result<KnotDistribution, OracleError>;
}

impl<T: InvariantOracle + ?Sized> InvariantOracle for &T {
    fn identify(
        &self,
        segment: &ChainSegment<'_>,
        closure: &ClosureConfig,
    ) -> Result<KnotDistribution, OracleError> {
        (**self).identify(segment, closure)
    }
}
