//! Playback-synchronized scroll engine
//!
//! [`Engine`] is the single owner of all mutable sync state. External
//! collaborators never mutate it directly: the media element and the
//! renderer push [`EngineEvent`]s onto an ordered queue, and the embedding
//! application drives [`Engine::tick`] from its display-refresh callback.
//!
//! ## Frame order
//!
//! Each tick runs one deterministic pass:
//!
//! 1. drain the event queue in arrival order (clock samples, gestures,
//!    manual scrolls, seek requests),
//! 2. run the interaction release timer if it expired,
//! 3. advance the time interpolator,
//! 4. resolve the current line,
//! 5. move the scroll offset,
//! 6. publish a view snapshot.
//!
//! Interpolation, resolution, and placement therefore always observe one
//! consistent snapshot per frame.

pub mod clock;
pub mod interaction;
pub mod interpolator;
pub mod layout;
pub mod scroller;
pub mod timeline;

pub use clock::PlaybackClock;
pub use interaction::{InteractionArbitrator, SyncMode};
pub use interpolator::TimeInterpolator;
pub use layout::LineLayout;
pub use scroller::ScrollAnimator;
pub use timeline::{Line, anchor_glyph, first_text_line, nearest_text_at_or_before, resolve_line_index};

use std::collections::VecDeque;

use crate::config::EngineConfig;
use crate::media::{MediaController, MediaEvent};
use crate::view::{SharedViewState, ViewSnapshot};

/// Inputs consumed by the engine, one queue entry per occurrence.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Notification from the media element
    Media(MediaEvent),
    /// Explicit user gesture on the scroll surface (press, drag, wheel)
    Gesture,
    /// The scroll view's offset changed
    ScrollChanged { offset: f32 },
    /// The rendering collaborator asked for a seek to an absolute time
    SeekRequested { absolute: f64 },
}

/// The scroll-synchronization engine.
pub struct Engine {
    config: EngineConfig,
    lines: Vec<Line>,
    clock: PlaybackClock,
    interpolator: TimeInterpolator,
    arbitrator: InteractionArbitrator,
    scroller: ScrollAnimator,
    layout: LineLayout,
    media: Box<dyn MediaController>,
    events: VecDeque<EngineEvent>,
    view: SharedViewState,
    current_line: Option<usize>,
    last_tick: Option<f64>,
    torn_down: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("lines", &self.lines.len())
            .field("clock", &self.clock)
            .field("mode", &self.arbitrator.mode())
            .field("current_line", &self.current_line)
            .finish()
    }
}

impl Engine {
    /// Create an engine over a pre-parsed timeline and a media backend.
    pub fn new(lines: Vec<Line>, media: Box<dyn MediaController>, config: EngineConfig) -> Self {
        let clock = PlaybackClock::new(config.placeholder_duration);
        let layout = LineLayout::new(config.line_spacing);
        Self {
            clock,
            layout,
            lines,
            media,
            interpolator: TimeInterpolator::new(),
            arbitrator: InteractionArbitrator::new(),
            scroller: ScrollAnimator::new(),
            events: VecDeque::new(),
            view: SharedViewState::new(),
            current_line: None,
            last_tick: None,
            torn_down: false,
            config,
        }
    }

    /// Handle for the rendering collaborator's non-blocking reads.
    pub fn view(&self) -> SharedViewState {
        self.view.clone()
    }

    /// Queue an input for the next frame.
    pub fn push_event(&mut self, event: EngineEvent) {
        if self.torn_down {
            return;
        }
        self.events.push_back(event);
    }

    /// Measured line heights from the renderer (content units).
    pub fn set_line_heights(&mut self, heights: Vec<f32>) {
        self.layout.set_heights(heights);
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Playback position within the current loop.
    pub fn display_time(&self) -> f64 {
        self.clock.display_time()
    }

    /// Total elapsed position across all completed loops.
    pub fn absolute_time(&self) -> f64 {
        self.clock.absolute_time()
    }

    /// Smoothed absolute time driving the scroll position.
    pub fn absolute_scroll_time(&self) -> f64 {
        self.interpolator.current()
    }

    pub fn duration(&self) -> f64 {
        self.clock.duration()
    }

    pub fn loop_count(&self) -> u64 {
        self.clock.loop_count()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Index of the line the playback position is on, if any.
    pub fn current_line_index(&self) -> Option<usize> {
        self.current_line
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroller.offset()
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.arbitrator.mode()
    }

    /// Seek to an absolute (multi-loop) time.
    pub fn request_seek(&mut self, absolute: f64) {
        if self.torn_down {
            return;
        }
        let now = self.last_tick.unwrap_or(0.0);
        self.do_seek(absolute, now);
    }

    /// Reset to the top of the first loop and start playback.
    pub fn start(&mut self) {
        if self.torn_down {
            return;
        }
        let now = self.last_tick.unwrap_or(0.0);
        self.arbitrator.clear();
        self.scroller.snap_to(0.0);
        self.do_seek(0.0, now);
        if let Err(err) = self.media.play() {
            tracing::warn!(error = %err, "playback start failed");
        }
    }

    /// Toggle playback. Ignored until the media reports it is ready.
    pub fn toggle_play_pause(&mut self) {
        if self.torn_down {
            return;
        }
        if !self.clock.is_ready() {
            tracing::debug!("media not ready, ignoring transport toggle");
            return;
        }
        let result = if self.clock.is_playing() {
            self.media.pause()
        } else {
            self.media.play()
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "transport toggle failed");
        }
    }

    /// Best-effort resume.
    pub fn play(&mut self) {
        if let Err(err) = self.media.play() {
            tracing::warn!(error = %err, "play failed");
        }
    }

    /// Best-effort pause.
    pub fn pause(&mut self) {
        if let Err(err) = self.media.pause() {
            tracing::warn!(error = %err, "pause failed");
        }
    }

    /// Cancel all outstanding timers and stop processing.
    ///
    /// After teardown no queued or future event mutates state.
    pub fn teardown(&mut self) {
        self.arbitrator.clear();
        self.clock.clear_pending();
        self.events.clear();
        self.torn_down = true;
    }

    /// Run one frame at the given engine-clock timestamp (seconds).
    pub fn tick(&mut self, now: f64) {
        if self.torn_down {
            return;
        }
        let dt = match self.last_tick {
            Some(last) if now > last => (now - last).clamp(0.001, 0.1),
            _ => 1.0 / 60.0,
        };
        self.last_tick = Some(now);

        while let Some(event) = self.events.pop_front() {
            self.handle_event(event, now);
        }
        // The programmatic flag covers exactly the echo frame.
        self.arbitrator.end_frame();

        if self.arbitrator.poll_release(now) {
            self.run_release(now);
        }

        let playing = self.clock.is_playing();
        let time = self.interpolator.tick(
            dt,
            playing,
            self.clock.duration(),
            &self.config.time_smoothing,
            self.config.time_snap_threshold,
        );

        self.current_line = resolve_line_index(&self.lines, time, self.clock.duration());

        let locked = self.arbitrator.is_locked();
        let wrote = self.scroller.frame(
            playing,
            locked,
            &self.lines,
            &self.layout,
            time,
            self.clock.duration(),
            self.config.min_line_span,
            &self.config.scroll_motion,
        );
        if wrote {
            self.arbitrator.mark_programmatic_write();
        }

        self.publish();
    }

    fn handle_event(&mut self, event: EngineEvent, now: f64) {
        match event {
            EngineEvent::Media(event) => self.handle_media_event(event, now),
            EngineEvent::Gesture => {
                self.arbitrator.note_gesture(
                    now,
                    self.clock.is_playing(),
                    self.scroller.offset(),
                    &self.config,
                );
            }
            EngineEvent::ScrollChanged { offset } => {
                if !offset.is_finite() {
                    tracing::warn!(offset = offset as f64, "discarding invalid scroll offset");
                    return;
                }
                let previous = self.scroller.offset();
                if self
                    .arbitrator
                    .note_scroll(now, self.clock.is_playing(), previous, &self.config)
                {
                    self.scroller.force_offset(offset);
                }
            }
            EngineEvent::SeekRequested { absolute } => self.do_seek(absolute, now),
        }
    }

    fn handle_media_event(&mut self, event: MediaEvent, now: f64) {
        match event {
            MediaEvent::TimeUpdate { position } => {
                if let Some(target) = self.arbitrator.seek_suppression(now) {
                    if (position - target).abs() > self.config.settle_tolerance {
                        // The media kept moving past the seek target; follow
                        // it but keep the loop the user chose.
                        self.clock.force_display(position);
                        self.interpolator.set_target(self.clock.absolute_time());
                    }
                    return;
                }
                self.clock.apply_sample(position);
                self.interpolator.set_target(self.clock.absolute_time());
            }
            MediaEvent::LoadedMetadata { duration } => {
                tracing::debug!(duration, "media metadata resolved");
                if let Some(display) = self.clock.apply_metadata(duration) {
                    self.write_media_position(display, now);
                }
                self.interpolator.set_target(self.clock.absolute_time());
            }
            MediaEvent::CanPlay => {
                if !self.clock.metadata_known() {
                    if let Some(duration) = self.media.duration() {
                        if let Some(display) = self.clock.apply_metadata(duration) {
                            self.write_media_position(display, now);
                        }
                    }
                }
                if let Some(display) = self.clock.apply_can_play() {
                    self.write_media_position(display, now);
                }
            }
            MediaEvent::Started => {
                self.clock.set_playing(true);
                let position = self.media.current_time();
                if position.is_finite() && position >= 0.0 {
                    self.clock.apply_sample(position);
                }
                self.interpolator.set_target(self.clock.absolute_time());
            }
            MediaEvent::Paused => {
                self.clock.set_playing(false);
                self.interpolator.set_target(self.clock.absolute_time());
            }
            MediaEvent::Ended => {
                self.clock.handle_ended();
                self.interpolator.set_target(self.clock.absolute_time());
            }
            MediaEvent::Error { message } => {
                tracing::warn!(%message, "media element reported an error");
            }
        }
    }

    /// Validate and execute a seek, buffering it when the media is not
    /// ready. The engine state reflects the intended position immediately;
    /// the media write is best-effort.
    fn do_seek(&mut self, absolute: f64, now: f64) {
        if !absolute.is_finite() || absolute < 0.0 {
            tracing::warn!(seek_target = absolute, "discarding invalid seek target");
            return;
        }
        let playing = self.clock.is_playing();
        match self.clock.begin_seek(absolute) {
            Some(display) => {
                if let Err(err) = self.media.set_current_time(display) {
                    tracing::warn!(error = %err, "media position write failed");
                }
                self.arbitrator.note_seek(display, now, playing, &self.config);
            }
            None => {
                tracing::debug!(seek_target = absolute, "media not ready, seek buffered");
                self.arbitrator
                    .note_seek(self.clock.display_time(), now, playing, &self.config);
            }
        }
        self.interpolator.snap_to(self.clock.absolute_time());
    }

    /// Flush a buffered seek's display time to the media.
    fn write_media_position(&mut self, display: f64, now: f64) {
        if let Err(err) = self.media.set_current_time(display) {
            tracing::warn!(error = %err, "media position write failed");
        }
        self.arbitrator
            .note_seek(display, now, self.clock.is_playing(), &self.config);
        self.interpolator.snap_to(self.clock.absolute_time());
    }

    /// The lock's release timer fired: snap to the nearest line in the last
    /// scroll direction and seek the implied time.
    fn run_release(&mut self, now: f64) {
        let origin = self.arbitrator.release();
        let offset = self.scroller.offset();
        let direction = offset - origin;

        let Some((loop_number, index)) = self.nearest_text_line(offset, direction) else {
            tracing::debug!("no snap candidate at release, resuming auto sync");
            return;
        };

        let duration = self.clock.duration();
        let line_time = self.lines[index].time;
        let mut target_loop = loop_number.max(0);
        let mut target_time = target_loop as f64 * duration + line_time;
        if !target_time.is_finite() || target_time < 0.0 {
            tracing::warn!(seek_target = target_time, "discarding invalid release target");
            return;
        }

        let jump = (target_time - self.clock.absolute_time()).abs();
        if jump > self.config.max_seek_jump_loops * duration {
            // Conservative fallback: stay in the current loop, or the next
            // one when the chosen line is already behind the playhead.
            let mut fallback_loop = self.clock.loop_count() as i64;
            if line_time < self.clock.display_time() {
                fallback_loop += 1;
            }
            tracing::debug!(
                implied = target_time,
                fallback_loop,
                "release target implausibly far, clamping"
            );
            target_loop = fallback_loop;
            target_time = target_loop as f64 * duration + line_time;
        }

        if let Some(center) = self.layout.unrolled_center(target_loop, index) {
            self.scroller.snap_to(center);
            self.arbitrator.mark_programmatic_write();
        }
        self.do_seek(target_time, now);
    }

    /// Nearest non-rest line to the reference point in unrolled space,
    /// searching the given direction first.
    fn nearest_text_line(&self, offset: f32, direction: f32) -> Option<(i64, usize)> {
        let len = self.lines.len();
        if len == 0 || !self.layout.is_measured_for(len) {
            return None;
        }
        let loop_height = self.layout.loop_height();
        if loop_height <= 0.0 {
            return None;
        }
        let base_loop = (offset / loop_height).floor() as i64;

        // Closest line of any kind to the reference point
        let mut start: Option<(i64, usize, f32)> = None;
        for loop_number in (base_loop - 1)..=(base_loop + 1) {
            for index in 0..len {
                let Some(center) = self.layout.unrolled_center(loop_number, index) else {
                    continue;
                };
                let distance = (center - offset).abs();
                if start.map(|(_, _, best)| distance < best).unwrap_or(true) {
                    start = Some((loop_number, index, distance));
                }
            }
        }
        let (start_loop, start_index, _) = start?;

        // Walk the unrolled line sequence, preferred direction first, until
        // a line with text turns up.
        let flat_start = start_loop * len as i64 + start_index as i64;
        let preferred = if direction >= 0.0 { 1_i64 } else { -1_i64 };
        for step in [preferred, -preferred] {
            let mut flat = flat_start;
            for _ in 0..(3 * len) {
                let loop_number = flat.div_euclid(len as i64);
                let index = flat.rem_euclid(len as i64) as usize;
                if !self.lines[index].is_rest() {
                    return Some((loop_number, index));
                }
                flat += step;
            }
        }
        None
    }

    fn publish(&self) {
        self.view.publish(ViewSnapshot {
            display_time: self.clock.display_time(),
            absolute_scroll_time: self.interpolator.current(),
            duration: self.clock.duration(),
            is_playing: self.clock.is_playing(),
            current_line: self.current_line,
            scroll_offset: self.scroller.offset(),
            anchor_glyph: anchor_glyph(&self.lines, self.current_line, self.config.anchor_fallback),
        });
    }
}
