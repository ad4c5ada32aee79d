//! State published to the rendering collaborator
//!
//! The engine writes one [`ViewSnapshot`] per frame into a
//! [`SharedViewState`]; the renderer reads it without blocking and without
//! reaching into engine internals.

use std::sync::Arc;

use parking_lot::RwLock;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    /// Playback position within the current loop, in `[0, duration)`
    pub display_time: f64,
    /// Smoothed absolute time driving the scroll position
    pub absolute_scroll_time: f64,
    /// Track duration (placeholder until metadata resolves)
    pub duration: f64,
    /// Whether the media is playing
    pub is_playing: bool,
    /// Index of the line the playback position is on, if any
    pub current_line: Option<usize>,
    /// Content coordinate currently at the viewport reference point
    pub scroll_offset: f32,
    /// Glyph for the ambient anchor display
    pub anchor_glyph: char,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            display_time: 0.0,
            absolute_scroll_time: 0.0,
            duration: 0.0,
            is_playing: false,
            current_line: None,
            scroll_offset: 0.0,
            anchor_glyph: '♪',
        }
    }
}

/// Thread-safe handle to the last published snapshot.
///
/// The engine is the only writer; renderers clone the handle and read the
/// last-published values.
#[derive(Clone, Default)]
pub struct SharedViewState {
    inner: Arc<RwLock<ViewSnapshot>>,
}

impl std::fmt::Debug for SharedViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SharedViewState")
            .field("display_time", &inner.display_time)
            .field("absolute_scroll_time", &inner.absolute_scroll_time)
            .field("duration", &inner.duration)
            .field("is_playing", &inner.is_playing)
            .field("current_line", &inner.current_line)
            .finish()
    }
}

impl SharedViewState {
    /// Create a handle with an all-zero snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot. Called by the engine once per frame.
    pub fn publish(&self, snapshot: ViewSnapshot) {
        *self.inner.write() = snapshot;
    }

    /// Copy of the last published snapshot.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.inner.read().clone()
    }

    /// Playback position within the current loop.
    pub fn display_time(&self) -> f64 {
        self.inner.read().display_time
    }

    /// Smoothed absolute time driving the scroll position.
    pub fn absolute_scroll_time(&self) -> f64 {
        self.inner.read().absolute_scroll_time
    }

    /// Track duration.
    pub fn duration(&self) -> f64 {
        self.inner.read().duration
    }

    /// Whether the media is playing.
    pub fn is_playing(&self) -> bool {
        self.inner.read().is_playing
    }

    /// Index of the current line, if playback has reached one.
    pub fn current_line(&self) -> Option<usize> {
        self.inner.read().current_line
    }

    /// Content coordinate currently at the viewport reference point.
    pub fn scroll_offset(&self) -> f32 {
        self.inner.read().scroll_offset
    }

    /// Glyph for the ambient anchor display.
    pub fn anchor_glyph(&self) -> char {
        self.inner.read().anchor_glyph
    }
}
