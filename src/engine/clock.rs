//! Playback time tracking
//!
//! [`PlaybackClock`] folds raw, coarsely-updated media clock samples into a
//! loop-aware playback state: display time within the current loop, a loop
//! counter, and the absolute time derived from both. It also buffers seeks
//! issued before the media can accept a position write.
//!
//! The clock is a pure state machine: it decides what position should be
//! written to the media element and hands the value back to the caller,
//! which owns the actual (fallible) write.

/// Samples this far into the new loop drop a stale end-of-track flag.
const ENDED_FLAG_CLEAR_SECS: f64 = 1.0;

/// Loop-aware playback position state.
#[derive(Debug)]
pub struct PlaybackClock {
    /// Track duration; a configured placeholder until metadata resolves
    duration: f64,
    metadata_known: bool,
    /// Position within the current loop, `[0, duration)`
    display_time: f64,
    /// Completed loops
    loop_count: u64,
    playing: bool,
    /// Whether the media accepts position writes yet
    ready: bool,
    /// End-of-track notification seen, wrap not yet observed in samples
    just_ended: bool,
    /// Absolute seek target waiting for the media to become ready
    pending_seek: Option<f64>,
}

impl PlaybackClock {
    pub fn new(placeholder_duration: f64) -> Self {
        Self {
            duration: placeholder_duration.max(1.0),
            metadata_known: false,
            display_time: 0.0,
            loop_count: 0,
            playing: false,
            ready: false,
            just_ended: false,
            pending_seek: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn metadata_known(&self) -> bool {
        self.metadata_known
    }

    pub fn display_time(&self) -> f64 {
        self.display_time
    }

    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_pending_seek(&self) -> bool {
        self.pending_seek.is_some()
    }

    /// Total elapsed position across all completed loops.
    pub fn absolute_time(&self) -> f64 {
        self.loop_count as f64 * self.duration + self.display_time
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Fold one raw clock sample into the state.
    ///
    /// A drop of more than half the duration is a wraparound and increments
    /// the loop counter, unless the end-of-track notification already
    /// counted this wrap.
    pub fn apply_sample(&mut self, raw: f64) {
        if !raw.is_finite() || raw < 0.0 {
            tracing::warn!(sample = raw, "discarding invalid clock sample");
            return;
        }

        let previous = self.display_time;
        let wrapped = raw < previous && previous - raw > self.duration * 0.5;
        if wrapped {
            if self.just_ended {
                // The end notification already counted this wrap.
                self.just_ended = false;
            } else {
                self.loop_count += 1;
            }
        } else if self.just_ended && raw > ENDED_FLAG_CLEAR_SECS && raw < self.duration * 0.5 {
            // The wrap was counted from samples before the end notification
            // arrived; drop the flag once playback is inside the new loop.
            self.just_ended = false;
        }

        self.display_time = raw;
    }

    /// Accept a sample while a seek settles, keeping the chosen loop count.
    pub fn force_display(&mut self, raw: f64) {
        if !raw.is_finite() || raw < 0.0 {
            return;
        }
        self.display_time = raw;
    }

    /// Fold the end-of-track notification (the track restarts itself).
    ///
    /// Increments the loop counter exactly once per cycle: repeated
    /// notifications and notifications arriving after the sample clock has
    /// already wrapped are ignored.
    pub fn handle_ended(&mut self) {
        if self.just_ended {
            return;
        }
        if self.display_time < self.duration * 0.5 {
            // Samples already show the new loop; the wrap was counted.
            return;
        }
        self.loop_count += 1;
        self.just_ended = true;
    }

    /// Move the clock to an absolute position.
    ///
    /// State updates immediately for observers. Returns the display time to
    /// write to the media if it is ready, otherwise the target is stored
    /// and applied when the media becomes ready or metadata resolves.
    pub fn begin_seek(&mut self, absolute: f64) -> Option<f64> {
        let base = self.duration.max(1.0);
        let display = absolute % base;
        self.display_time = display;
        self.loop_count = (absolute / base).floor() as u64;
        self.just_ended = false;

        if self.ready {
            self.pending_seek = None;
            Some(display)
        } else {
            self.pending_seek = Some(absolute);
            None
        }
    }

    /// Replace the placeholder duration with real metadata.
    ///
    /// Any buffered seek is recomputed against the new duration; the
    /// returned display time should be written to the media.
    pub fn apply_metadata(&mut self, raw_duration: f64) -> Option<f64> {
        if !raw_duration.is_finite() || raw_duration <= 0.0 {
            tracing::warn!(duration = raw_duration, "discarding invalid media duration");
            return None;
        }
        self.duration = raw_duration.floor().max(1.0);
        self.metadata_known = true;
        self.take_pending()
    }

    /// Mark the media ready for position writes and flush any buffered seek.
    pub fn apply_can_play(&mut self) -> Option<f64> {
        self.ready = true;
        self.take_pending()
    }

    pub fn clear_pending(&mut self) {
        self.pending_seek = None;
    }

    /// Apply the buffered seek against the current duration, clearing it
    /// exactly once.
    fn take_pending(&mut self) -> Option<f64> {
        let absolute = self.pending_seek.take()?;
        let base = self.duration.max(1.0);
        let display = absolute % base;
        self.display_time = display;
        self.loop_count = (absolute / base).floor() as u64;
        Some(display)
    }
}
