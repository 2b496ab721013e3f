use crate::core::models::core_range::ProfileSample;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ProfileRecord {
    event_frame: usize,
    frame: usize,
    core_begin: Option<usize>,
    core_end: Option<usize>,
}

impl From<&ProfileSample> for ProfileRecord {
    fn from(sample: &ProfileSample) -> Self {
        Self {
            event_frame: sample.event_frame,
            frame: sample.frame,
            core_begin: sample.core.map(|c| c.begin),
            core_end: sample.core.map(|c| c.end),
        }
    }
}

/// Writes knot-core profile samples as CSV, one row per sampled frame.
///
/// Frames where no core could be found leave both core columns empty.
pub fn write_csv<W: Write>(samples: &[ProfileSample], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for sample in samples {
        csv_writer.serialize(ProfileRecord::from(sample))?;
    }
    csv_writer.flush()?;
    Ok(())
}
