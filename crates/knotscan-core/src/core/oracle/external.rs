use super::traits::{ClosureConfig, InvariantOracle, KnotDistribution, OracleError};
use crate::core::io::nxyz;
use crate::core::models::chain::ChainSegment;
use crate::core::models::knot::{KnotType, ParseKnotTypeError};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Oracle backed by an external invariant calculator process.
///
/// Each call writes the segment to its own scratch file in indexed-xyz form and runs
/// `program [args...] <scratch> <closure-code> <tries> <max-cross>`. The program must
/// print one `<knot-type> [weight]` line per outcome; a missing weight counts as `1`.
/// The scratch file is removed when the call returns, whether or not it succeeded.
#[derive(Debug, Clone)]
pub struct ExternalOracle {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ExternalOracle {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn write_scratch(segment: &ChainSegment<'_>) -> Result<NamedTempFile, OracleError> {
        let scratch = tempfile::Builder::new()
            .prefix("knotscan-")
            .suffix(".nxyz")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(scratch.as_file());
            nxyz::write_segment(segment, &mut writer)?;
            writer.flush()?;
        }
        Ok(scratch)
    }

    /// Waits for the calculator while its output is being read.
    ///
    /// Both pipes are drained concurrently, so a calculator that writes more than a
    /// pipe buffer still runs to completion.
    fn collect_output(&self, mut child: Child) -> Result<Output, OracleError> {
        let Some(limit) = self.timeout else {
            return child.wait_with_output().map_err(OracleError::Pipe);
        };

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().map_err(OracleError::Pipe)? {
                break status;
            }
            if started.elapsed() >= limit {
                if let Err(e) = child.kill() {
                    warn!(error = %e, "Failed to kill timed-out invariant calculator.");
                }
                let _ = child.wait();
                // Readers end on their own once the pipes close.
                return Err(OracleError::Timeout { after: limit });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Output {
            status,
            stdout: join_reader(stdout)?,
            stderr: join_reader(stderr)?,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, OracleError> {
    handle
        .join()
        .map_err(|_| OracleError::Pipe(io::Error::other("output reader thread panicked")))?
        .map_err(OracleError::Pipe)
}

impl InvariantOracle for ExternalOracle {
    fn identify(
        &self,
        segment: &ChainSegment<'_>,
        closure: &ClosureConfig,
    ) -> Result<KnotDistribution, OracleError> {
        let scratch = Self::write_scratch(segment)?;

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(scratch.path())
            .arg(closure.method.code().to_string())
            .arg(closure.tries.to_string())
            .arg(closure.max_cross.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let output = self.collect_output(child)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            return Err(OracleError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let distribution = parse_output(&stdout)?;
        debug!(
            first = segment.first_index,
            last = segment.last_index(),
            outcomes = distribution.entries().len(),
            "External oracle call finished."
        );
        Ok(distribution)
    }
}

fn parse_output(stdout: &str) -> Result<KnotDistribution, OracleError> {
    let mut distribution = KnotDistribution::new();
    for (idx, line) in stdout.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let knot: KnotType = fields
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(|e: ParseKnotTypeError| OracleError::Protocol {
                line: idx + 1,
                message: e.to_string(),
            })?;
        let weight = match fields.next() {
            Some(raw) => raw.parse::<f64>().map_err(|_| OracleError::Protocol {
                line: idx + 1,
                message: format!("invalid weight '{}'", raw),
            })?,
            None => 1.0,
        };
        if !weight.is_finite() || weight < 0.0 {
            return Err(OracleError::Protocol {
                line: idx + 1,
                message: format!("weight must be a non-negative number, got {}", weight),
            });
        }
        distribution.add(knot, weight);
    }
    Ok(distribution)
}
