use thiserror::Error;

use crate::events::SlippiVersion;

/// Failures raised while decoding a replay file.
///
/// The split follows what a batch runner needs to know: every variant here is
/// fatal for the file that produced it, while recoverable anomalies (dropped
/// incomplete frames, unknown action-state ids) are logged and absorbed by the
/// pipeline instead of surfacing as errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("replay version {0} predates the minimum supported revision")]
    UnsupportedVersion(SlippiVersion),

    #[error("malformed stream at byte {offset}: {reason}")]
    MalformedStream { offset: usize, reason: String },

    #[error("replay truncated at byte {offset}: {needed} more byte(s) required")]
    TruncatedReplay { offset: usize, needed: usize },

    #[error("metadata is missing mandatory field `{0}`")]
    MissingMetadata(&'static str),
}

impl ReplayError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedStream {
            offset,
            reason: reason.into(),
        }
    }
}
