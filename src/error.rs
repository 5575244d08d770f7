//! Error types shared by the registry, the coordinator and project persistence

use thiserror::Error;

use crate::types::segment::SegmentStatus;

/// Errors raised by audio handles and the playback coordinator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The audio url could not be fetched or decoded
    #[error("Failed to load audio for {id}: {reason}")]
    Load { id: String, reason: String },

    /// Playback was refused until the user interacts with the player
    #[error("Playback blocked until the user interacts with the player")]
    AutoplayBlocked,

    /// The signed url bound to the handle is no longer valid
    #[error("Audio url for {0} has expired")]
    ExpiredUrl(String),

    /// A pending start was superseded by the coordinator replacing the source
    #[error("Playback of {0} was cancelled by a source change")]
    Cancelled(String),

    /// The handle never left the loading phase
    #[error("Timed out loading audio for {0}")]
    LoadTimeout(String),

    /// The signed url resolver failed
    #[error("Failed to resolve a playable url for {key}: {reason}")]
    UrlResolve { key: String, reason: String },

    /// The audio backend itself failed (element creation, state change)
    #[error("Audio backend error: {0}")]
    Backend(String),
}

impl PlaybackError {
    /// Cancellations come from our own source replacement and are never shown.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, PlaybackError::Cancelled(_))
    }
}

/// Errors raised while editing or persisting a project.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid project file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Unknown clip: {0}")]
    UnknownClip(String),

    #[error("Unknown segment: {0}")]
    UnknownSegment(String),

    #[error("Segment {id} cannot change while {status:?}")]
    InvalidSegmentState { id: String, status: SegmentStatus },

    #[error("Invalid clip {id}: {reason}")]
    InvalidClip { id: String, reason: String },
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_not_user_facing() {
        assert!(!PlaybackError::Cancelled("a".to_string()).is_user_facing());
        assert!(PlaybackError::AutoplayBlocked.is_user_facing());
        assert!(PlaybackError::ExpiredUrl("a".to_string()).is_user_facing());
    }

    #[test]
    fn test_error_messages() {
        let err = PlaybackError::Load {
            id: "seg-1".to_string(),
            reason: "404".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to load audio for seg-1: 404");
    }
}
