//! Engine tuning configuration
//!
//! Every tuning constant of the sync engine lives here rather than inline:
//! release timers, snap thresholds, and the distance-band motion tables
//! used by the time interpolator and the scroll animator. The whole struct
//! round-trips through serde so an embedding application can ship its own
//! tuning as data.

use serde::{Deserialize, Serialize};

/// One band of a distance-adaptive blend table, in seconds.
///
/// A gap of at most `up_to` seconds is corrected by `factor` per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionBand {
    /// Upper bound of the gap this band covers (seconds)
    pub up_to: f64,
    /// Correction fraction applied per frame within this band
    pub factor: f64,
}

/// One band of a distance-adaptive step table, in content units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepBand {
    /// Upper bound of the remaining distance this band covers
    pub up_to: f32,
    /// Step fraction applied per frame within this band
    pub factor: f32,
}

/// Distance-banded blend table for smoothing the playback time estimate.
///
/// Bands are ordered by ascending `up_to`; gaps beyond the last band use
/// `catch_up_factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendProfile {
    #[serde(default = "default_time_bands")]
    pub bands: Vec<MotionBand>,
    /// Fraction used beyond the last band (fast catch-up)
    #[serde(default = "default_time_catch_up")]
    pub catch_up_factor: f64,
}

impl BlendProfile {
    /// Correction fraction for a gap of the given magnitude.
    pub fn factor_for(&self, distance: f64) -> f64 {
        for band in &self.bands {
            if distance <= band.up_to {
                return band.factor;
            }
        }
        self.catch_up_factor
    }
}

impl Default for BlendProfile {
    fn default() -> Self {
        Self {
            bands: default_time_bands(),
            catch_up_factor: default_time_catch_up(),
        }
    }
}

/// Distance-banded step table for moving the scroll offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProfile {
    #[serde(default = "default_step_bands")]
    pub bands: Vec<StepBand>,
    /// Step fraction used beyond the last band
    #[serde(default = "default_step_catch_up")]
    pub catch_up_factor: f32,
    /// Per-frame movement cap (content units)
    #[serde(default = "default_max_step")]
    pub max_step: f32,
    /// Remaining distance below which the offset snaps straight to target
    #[serde(default = "default_snap_epsilon")]
    pub snap_epsilon: f32,
}

impl StepProfile {
    /// Step fraction for a remaining distance of the given magnitude.
    pub fn factor_for(&self, distance: f32) -> f32 {
        for band in &self.bands {
            if distance <= band.up_to {
                return band.factor;
            }
        }
        self.catch_up_factor
    }
}

impl Default for StepProfile {
    fn default() -> Self {
        Self {
            bands: default_step_bands(),
            catch_up_factor: default_step_catch_up(),
            max_step: default_max_step(),
            snap_epsilon: default_snap_epsilon(),
        }
    }
}

/// Complete engine configuration.
///
/// All timing values are in seconds, distances in content units (the
/// renderer's logical pixels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Assumed track duration until real media metadata arrives
    #[serde(default = "default_placeholder_duration")]
    pub placeholder_duration: f64,

    // === Interaction ===
    /// Lock release delay while the media is playing.
    /// Longer than the paused delay: resyncing mid-playback is more jarring.
    #[serde(default = "default_release_delay_playing")]
    pub release_delay_playing: f64,
    /// Lock release delay while the media is paused
    #[serde(default = "default_release_delay_paused")]
    pub release_delay_paused: f64,
    /// Post-seek window tolerance: raw clock samples within this distance of
    /// the seek target are ignored while the seek settles
    #[serde(default = "default_settle_tolerance")]
    pub settle_tolerance: f64,

    // === Time tracking ===
    /// Gap beyond which the interpolator resyncs hard instead of blending
    #[serde(default = "default_time_snap_threshold")]
    pub time_snap_threshold: f64,
    /// Seek targets further than this many loop durations away are clamped
    /// to a conservative nearby estimate
    #[serde(default = "default_max_seek_jump_loops")]
    pub max_seek_jump_loops: f64,
    /// Timestamp gap below which two lines are treated as simultaneous
    #[serde(default = "default_min_line_span")]
    pub min_line_span: f64,
    #[serde(default)]
    pub time_smoothing: BlendProfile,

    // === Scrolling ===
    /// Vertical spacing between lines (content units)
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
    #[serde(default)]
    pub scroll_motion: StepProfile,

    // === Content ===
    /// Glyph shown when the timeline has no text at all
    #[serde(default = "default_anchor_fallback")]
    pub anchor_fallback: char,
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config = serde_json::from_str(json)?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placeholder_duration: default_placeholder_duration(),
            release_delay_playing: default_release_delay_playing(),
            release_delay_paused: default_release_delay_paused(),
            settle_tolerance: default_settle_tolerance(),
            time_snap_threshold: default_time_snap_threshold(),
            max_seek_jump_loops: default_max_seek_jump_loops(),
            min_line_span: default_min_line_span(),
            time_smoothing: BlendProfile::default(),
            line_spacing: default_line_spacing(),
            scroll_motion: StepProfile::default(),
            anchor_fallback: default_anchor_fallback(),
        }
    }
}

fn default_placeholder_duration() -> f64 {
    364.0
}

fn default_release_delay_playing() -> f64 {
    1.0
}

fn default_release_delay_paused() -> f64 {
    0.5
}

fn default_settle_tolerance() -> f64 {
    0.5
}

fn default_time_snap_threshold() -> f64 {
    1.0
}

fn default_max_seek_jump_loops() -> f64 {
    2.0
}

fn default_min_line_span() -> f64 {
    0.01
}

fn default_line_spacing() -> f32 {
    8.0
}

fn default_anchor_fallback() -> char {
    '♪'
}

fn default_time_bands() -> Vec<MotionBand> {
    vec![
        MotionBand {
            up_to: 0.05,
            factor: 0.08,
        },
        MotionBand {
            up_to: 0.25,
            factor: 0.2,
        },
    ]
}

fn default_time_catch_up() -> f64 {
    0.4
}

fn default_step_bands() -> Vec<StepBand> {
    vec![
        StepBand {
            up_to: 8.0,
            factor: 0.1,
        },
        StepBand {
            up_to: 64.0,
            factor: 0.18,
        },
    ]
}

fn default_step_catch_up() -> f32 {
    0.3
}

fn default_max_step() -> f32 {
    48.0
}

fn default_snap_epsilon() -> f32 {
    0.5
}
