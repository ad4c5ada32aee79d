//! Media collaborator boundary
//!
//! The engine never decodes or plays audio itself. It drives an external
//! media element through the [`MediaController`] trait and receives that
//! element's notifications as [`MediaEvent`] values pushed into the engine
//! queue.
//!
//! ## Architecture
//! ```text
//! Engine --[MediaController: play/pause/set_current_time]--> media element
//! Engine <--[MediaEvent via EngineEvent::Media]------------- media element
//! ```
//!
//! All control calls are best-effort: the engine catches and logs failures,
//! and its own state keeps reflecting the intended position.

use thiserror::Error;

/// Errors surfaced by a media backend.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The backend refused a position write (not ready, out of range, ...)
    #[error("position write rejected: {0}")]
    SeekRejected(String),
    /// A transport control (play/pause) failed
    #[error("transport control failed")]
    Transport(#[from] anyhow::Error),
}

/// Control surface of the external media element.
///
/// Implementations wrap whatever actually plays audio: an HTML media
/// element bridge, an audio thread handle, a test double. Every method may
/// be called from the engine's single thread only.
pub trait MediaController {
    /// Current playback position within the track, in seconds.
    fn current_time(&self) -> f64;

    /// Track duration in seconds, if known yet.
    fn duration(&self) -> Option<f64>;

    /// Write the playback position (seconds within the track).
    fn set_current_time(&mut self, position: f64) -> Result<(), MediaError>;

    /// Begin or resume playback.
    fn play(&mut self) -> Result<(), MediaError>;

    /// Pause playback.
    fn pause(&mut self) -> Result<(), MediaError>;
}

/// Notifications emitted by the media element.
///
/// Cadence is unspecified: `TimeUpdate` in particular may arrive coarsely
/// (a few times per second) and is smoothed by the engine's interpolator.
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Raw playback clock sample, bounded to `[0, duration)`
    TimeUpdate { position: f64 },
    /// Real track duration became known
    LoadedMetadata { duration: f64 },
    /// The element is ready to accept position writes
    CanPlay,
    /// Playback started or resumed
    Started,
    /// Playback paused
    Paused,
    /// The track reached its end (it is configured to restart itself)
    Ended,
    /// The element reported an error
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_error_messages_name_the_operation() {
        let err = MediaError::SeekRejected("element not ready".to_string());
        assert!(err.to_string().contains("position write rejected"));

        let err = MediaError::Transport(anyhow::anyhow!("device lost"));
        assert!(err.to_string().contains("transport control failed"));
    }
}
