use thiserror::Error;

use super::config::ConfigError;
use crate::core::oracle::traits::OracleError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invariant oracle failed{}: {source}", frame_suffix(.frame))]
    Oracle {
        frame: Option<usize>,
        #[source]
        source: OracleError,
    },

    #[error("Frame {frame} is outside the trajectory (last frame is {max_frame})")]
    FrameOutOfRange { frame: usize, max_frame: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

fn frame_suffix(frame: &Option<usize>) -> String {
    frame.map(|f| format!(" on frame {}", f)).unwrap_or_default()
}

impl EngineError {
    pub fn oracle(frame: usize, source: OracleError) -> Self {
        EngineError::Oracle {
            frame: Some(frame),
            source,
        }
    }
}

impl From<OracleError> for EngineError {
    fn from(source: OracleError) -> Self {
        EngineError::Oracle {
            frame: None,
            source,
        }
    }
}
