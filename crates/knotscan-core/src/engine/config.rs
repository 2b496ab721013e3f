use crate::core::models::chain::Terminus;
use crate::core::models::core_range::KnotCore;
use crate::core::models::event::OutputFormat;
use crate::core::oracle::traits::ClosureConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Frame-window thresholds that decide whether a topology change is a real event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionConfig {
    /// Frames inspected before a knotting candidate; at most 20% of them may be knotted.
    pub min_gap: usize,
    /// Frames after a knotting candidate that must all be knotted.
    pub scope: usize,
    /// Shortest lifetime, in frames, of a reported knot.
    pub min_knot: usize,
    /// Whole-frame classifications use every `scan_stride`-th point.
    pub scan_stride: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_gap: 10,
            scope: 10,
            min_knot: 100,
            scan_stride: 2,
        }
    }
}

/// Tunables of the knot-core localizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalizerConfig {
    /// Consecutive non-confirming trims tolerated before a direction gives up.
    pub gap: usize,
    /// Minimum confidence for a label to confirm the knot.
    pub cutoff: f64,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            gap: 1,
            cutoff: 0.42,
        }
    }
}

impl LocalizerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cutoff > 0.0 && self.cutoff <= 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "cutoff",
                reason: format!("must lie in (0, 1], got {}", self.cutoff),
            });
        }
        Ok(())
    }
}

fn validate_closure(closure: &ClosureConfig) -> Result<(), ConfigError> {
    if closure.tries == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "tries",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub terminus: Terminus,
    pub detection: DetectionConfig,
    pub closure: ClosureConfig,
    pub localizer: LocalizerConfig,
    /// Core of the native structure; enables loop-behavior rating.
    pub reference_core: Option<KnotCore>,
    pub output: OutputFormat,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    terminus: Option<Terminus>,
    min_gap: Option<usize>,
    scope: Option<usize>,
    min_knot: Option<usize>,
    scan_stride: Option<usize>,
    closure: Option<ClosureConfig>,
    gap: Option<usize>,
    cutoff: Option<f64>,
    reference_core: Option<KnotCore>,
    output: Option<OutputFormat>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminus(mut self, terminus: Terminus) -> Self {
        self.terminus = Some(terminus);
        self
    }
    pub fn min_gap(mut self, frames: usize) -> Self {
        self.min_gap = Some(frames);
        self
    }
    pub fn scope(mut self, frames: usize) -> Self {
        self.scope = Some(frames);
        self
    }
    pub fn min_knot(mut self, frames: usize) -> Self {
        self.min_knot = Some(frames);
        self
    }
    pub fn scan_stride(mut self, stride: usize) -> Self {
        self.scan_stride = Some(stride);
        self
    }
    pub fn closure(mut self, closure: ClosureConfig) -> Self {
        self.closure = Some(closure);
        self
    }
    pub fn gap(mut self, gap: usize) -> Self {
        self.gap = Some(gap);
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn reference_core(mut self, core: Option<KnotCore>) -> Self {
        self.reference_core = core;
        self
    }
    pub fn output(mut self, format: OutputFormat) -> Self {
        self.output = Some(format);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let defaults = DetectionConfig::default();
        let detection = DetectionConfig {
            min_gap: self.min_gap.unwrap_or(defaults.min_gap),
            scope: self.scope.unwrap_or(defaults.scope),
            min_knot: self.min_knot.unwrap_or(defaults.min_knot),
            scan_stride: self.scan_stride.unwrap_or(defaults.scan_stride),
        };
        for (name, value) in [
            ("min_gap", detection.min_gap),
            ("scope", detection.scope),
            ("scan_stride", detection.scan_stride),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        let closure = self.closure.unwrap_or_default();
        validate_closure(&closure)?;

        let localizer_defaults = LocalizerConfig::default();
        let localizer = LocalizerConfig {
            gap: self.gap.unwrap_or(localizer_defaults.gap),
            cutoff: self.cutoff.unwrap_or(localizer_defaults.cutoff),
        };
        localizer.validate()?;

        if let Some(core) = self.reference_core {
            if core.begin > core.end {
                return Err(ConfigError::InvalidParameter {
                    name: "reference_core",
                    reason: format!("begin {} exceeds end {}", core.begin, core.end),
                });
            }
        }

        Ok(AnalysisConfig {
            terminus: self
                .terminus
                .ok_or(ConfigError::MissingParameter("terminus"))?,
            detection,
            closure,
            localizer,
            reference_core: self.reference_core,
            output: self.output.unwrap_or_default(),
        })
    }
}

/// Settings for a single-structure knot-core computation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KnotCoreConfig {
    pub closure: ClosureConfig,
    pub localizer: LocalizerConfig,
}

impl KnotCoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_closure(&self.closure)?;
        self.localizer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_reference_defaults() {
        let config = AnalysisConfigBuilder::new()
            .terminus(Terminus::N)
            .build()
            .unwrap();
        assert_eq!(config.detection, DetectionConfig::default());
        assert_eq!(config.detection.min_knot, 100);
        assert_eq!(config.closure, ClosureConfig::default());
        assert_eq!(config.localizer.gap, 1);
        assert_eq!(config.output, OutputFormat::Compact);
        assert!(config.reference_core.is_none());
    }

    #[test]
    fn terminus_is_required() {
        let result = AnalysisConfigBuilder::new().min_gap(5).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("terminus")));
    }

    #[test]
    fn rejects_zero_scope_and_out_of_range_cutoff() {
        let zero_scope = AnalysisConfigBuilder::new()
            .terminus(Terminus::C)
            .scope(0)
            .build();
        assert!(matches!(
            zero_scope,
            Err(ConfigError::InvalidParameter { name: "scope", .. })
        ));

        let bad_cutoff = AnalysisConfigBuilder::new()
            .terminus(Terminus::C)
            .cutoff(1.5)
            .build();
        assert!(matches!(
            bad_cutoff,
            Err(ConfigError::InvalidParameter { name: "cutoff", .. })
        ));
    }

    #[test]
    fn rejects_zero_tries() {
        let closure = ClosureConfig {
            tries: 0,
            ..ClosureConfig::default()
        };
        let result = AnalysisConfigBuilder::new()
            .terminus(Terminus::N)
            .closure(closure)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "tries", .. })
        ));
    }
}
