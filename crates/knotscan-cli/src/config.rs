use crate::cli::{AnalyzeArgs, ClosureArgs, CoreArgs, LocalizerArgs, OracleArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use knotscan::core::models::core_range::KnotCore;
use knotscan::core::models::event::OutputFormat;
use knotscan::core::oracle::external::ExternalOracle;
use knotscan::core::oracle::{ClosureConfig, ClosureMethod};
use knotscan::engine::config::{
    AnalysisConfig, AnalysisConfigBuilder, KnotCoreConfig, LocalizerConfig,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PROFILE_STEP: usize = 100;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDetectionConfig {
    terminus: Option<String>,
    min_gap: Option<usize>,
    scope: Option<usize>,
    min_knot: Option<usize>,
    scan_stride: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialClosureConfig {
    method: Option<String>,
    tries: Option<u32>,
    max_cross: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialKnotCoreConfig {
    gap: Option<usize>,
    cutoff: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOracleConfig {
    program: Option<PathBuf>,
    args: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialProfileConfig {
    step: Option<usize>,
}

/// Configuration file contents; every value is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialConfig {
    detection: Option<PartialDetectionConfig>,
    closure: Option<PartialClosureConfig>,
    knot_core: Option<PartialKnotCoreConfig>,
    oracle: Option<PartialOracleConfig>,
    profile: Option<PartialProfileConfig>,
    reference_core: Option<[usize; 2]>,
    detailed: Option<bool>,
}

/// How to invoke the external invariant calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleSettings {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl OracleSettings {
    pub fn build(&self) -> ExternalOracle {
        ExternalOracle::new(&self.program)
            .with_args(self.args.iter().cloned())
            .with_timeout(self.timeout)
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeSettings {
    pub config: AnalysisConfig,
    pub oracle: OracleSettings,
    /// Set only when a profile output path was given.
    pub profile_step: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub config: KnotCoreConfig,
    pub oracle: OracleSettings,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` if given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn merge_with_analyze(mut self, args: &AnalyzeArgs) -> Result<AnalyzeSettings> {
        self.apply_set_values(&args.set_values)?;

        let detection = self.detection.take().unwrap_or_default();

        let terminus = match args.terminus {
            Some(terminus) => terminus.into(),
            None => {
                let raw = detection.terminus.as_deref().ok_or_else(|| {
                    CliError::Config(
                        "A terminus is required either in the config file (`detection.terminus`) or via --terminus."
                            .to_string(),
                    )
                })?;
                parser::parse_terminus(raw).map_err(|e| CliError::Config(e.to_string()))?
            }
        };

        let reference_core = match args.reference_core.as_deref() {
            Some([begin, end]) => Some(Self::core_range(*begin, *end)?),
            Some(other) => {
                return Err(CliError::Argument(format!(
                    "--reference-core takes BEGIN and END, got {} value(s)",
                    other.len()
                )));
            }
            None => self
                .reference_core
                .map(|[begin, end]| Self::core_range(begin, end))
                .transpose()?,
        };

        let detailed = args.detailed || self.detailed.unwrap_or(false);
        let closure = Self::merge_closure(&args.closure, self.closure.take())?;
        let localizer = Self::merge_localizer(&args.localizer, self.knot_core.take());
        let oracle = Self::merge_oracle(&args.oracle, self.oracle.take())?;

        let profile_step = args.profile.as_ref().map(|_| {
            args.profile_step
                .or(self.profile.as_ref().and_then(|p| p.step))
                .unwrap_or(DEFAULT_PROFILE_STEP)
        });

        let mut builder = AnalysisConfigBuilder::new()
            .terminus(terminus)
            .closure(closure)
            .gap(localizer.gap)
            .cutoff(localizer.cutoff)
            .reference_core(reference_core)
            .output(if detailed {
                OutputFormat::Detailed
            } else {
                OutputFormat::Compact
            });
        if let Some(v) = args.min_gap.or(detection.min_gap) {
            builder = builder.min_gap(v);
        }
        if let Some(v) = args.scope.or(detection.scope) {
            builder = builder.scope(v);
        }
        if let Some(v) = args.min_knot.or(detection.min_knot) {
            builder = builder.min_knot(v);
        }
        if let Some(v) = args.scan_stride.or(detection.scan_stride) {
            builder = builder.scan_stride(v);
        }

        let config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AnalyzeSettings {
            config,
            oracle,
            profile_step,
        })
    }

    pub fn merge_with_core(mut self, args: &CoreArgs) -> Result<CoreSettings> {
        self.apply_set_values(&args.set_values)?;

        let config = KnotCoreConfig {
            closure: Self::merge_closure(&args.closure, self.closure.take())?,
            localizer: Self::merge_localizer(&args.localizer, self.knot_core.take()),
        };
        config
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(CoreSettings {
            config,
            oracle: Self::merge_oracle(&args.oracle, self.oracle.take())?,
        })
    }

    fn core_range(begin: usize, end: usize) -> Result<KnotCore> {
        parser::core_from_bounds(begin, end).ok_or_else(|| {
            CliError::Config(format!(
                "Reference core begins at {} but ends at {}.",
                begin, end
            ))
        })
    }

    fn merge_closure(
        cli: &ClosureArgs,
        file: Option<PartialClosureConfig>,
    ) -> Result<ClosureConfig> {
        let file = file.unwrap_or_default();
        let defaults = ClosureConfig::default();

        let method = match (cli.closure, file.method.as_deref()) {
            (Some(method), _) => method,
            (None, Some(raw)) => {
                ClosureMethod::from_str(raw).map_err(|e| CliError::Config(e.to_string()))?
            }
            (None, None) => defaults.method,
        };

        Ok(ClosureConfig {
            method,
            tries: cli.tries.or(file.tries).unwrap_or(defaults.tries),
            max_cross: cli.max_cross.or(file.max_cross).unwrap_or(defaults.max_cross),
        })
    }

    fn merge_localizer(
        cli: &LocalizerArgs,
        file: Option<PartialKnotCoreConfig>,
    ) -> LocalizerConfig {
        let file = file.unwrap_or_default();
        let defaults = LocalizerConfig::default();
        LocalizerConfig {
            gap: cli.gap.or(file.gap).unwrap_or(defaults.gap),
            cutoff: cli.cutoff.or(file.cutoff).unwrap_or(defaults.cutoff),
        }
    }

    fn merge_oracle(cli: &OracleArgs, file: Option<PartialOracleConfig>) -> Result<OracleSettings> {
        let file = file.unwrap_or_default();
        let program = cli.program.clone().or(file.program).ok_or_else(|| {
            CliError::Config(
                "An oracle program is required either in the config file (`oracle.program`) or via --oracle."
                    .to_string(),
            )
        })?;
        let args = if cli.args.is_empty() {
            file.args.unwrap_or_default()
        } else {
            cli.args.clone()
        };
        let timeout = cli
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs);

        Ok(OracleSettings {
            program,
            args,
            timeout,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) =
                parser::parse_assignment(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            match key {
                "detection.terminus" => {
                    parser::parse_terminus(value).map_err(|e| CliError::Config(e.to_string()))?;
                    self.detection().terminus = Some(value.to_string());
                }
                "detection.min-gap" => self.detection().min_gap = Some(parse_value(key, value)?),
                "detection.scope" => self.detection().scope = Some(parse_value(key, value)?),
                "detection.min-knot" => self.detection().min_knot = Some(parse_value(key, value)?),
                "detection.scan-stride" => {
                    self.detection().scan_stride = Some(parse_value(key, value)?)
                }
                "closure.method" => {
                    ClosureMethod::from_str(value).map_err(|e| CliError::Config(e.to_string()))?;
                    self.closure().method = Some(value.to_string());
                }
                "closure.tries" => self.closure().tries = Some(parse_value(key, value)?),
                "closure.max-cross" => self.closure().max_cross = Some(parse_value(key, value)?),
                "knot-core.gap" => self.knot_core().gap = Some(parse_value(key, value)?),
                "knot-core.cutoff" => self.knot_core().cutoff = Some(parse_value(key, value)?),
                "oracle.program" => self.oracle().program = Some(PathBuf::from(value)),
                "oracle.timeout-secs" => {
                    self.oracle().timeout_secs = Some(parse_value(key, value)?)
                }
                "profile.step" => {
                    self.profile
                        .get_or_insert_with(Default::default)
                        .step = Some(parse_value(key, value)?)
                }
                "reference-core" => {
                    let core = parser::parse_core_range(value)
                        .map_err(|e| CliError::Config(e.to_string()))?;
                    self.reference_core = Some([core.begin, core.end]);
                }
                "detailed" => self.detailed = Some(parse_value(key, value)?),
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn detection(&mut self) -> &mut PartialDetectionConfig {
        self.detection.get_or_insert_with(Default::default)
    }

    fn closure(&mut self) -> &mut PartialClosureConfig {
        self.closure.get_or_insert_with(Default::default)
    }

    fn knot_core(&mut self) -> &mut PartialKnotCoreConfig {
        self.knot_core.get_or_insert_with(Default::default)
    }

    fn oracle(&mut self) -> &mut PartialOracleConfig {
        self.oracle.get_or_insert_with(Default::default)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}
