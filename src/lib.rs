//! Loop-aware playback tracking and scroll synchronization
//!
//! This crate keeps a scrolling text view synchronized to the playback
//! position of a continuously looping audio track while letting the user
//! scroll freely and resynchronizing smoothly afterwards.
//!
//! ## Key components
//!
//! - [`Engine`]: single owner of all sync state, driven once per display
//!   frame
//! - [`engine::PlaybackClock`]: loop-aware playback time from coarse clock
//!   samples
//! - [`engine::TimeInterpolator`]: smooth per-frame time estimate
//! - [`engine::InteractionArbitrator`]: hands control between automatic
//!   sync and the user
//! - [`engine::ScrollAnimator`]: eases the scroll offset toward the line
//!   implied by the current time
//!
//! Audio playback and page rendering stay outside: the media element is
//! reached through [`MediaController`] and its notifications, the renderer
//! reads published [`ViewSnapshot`]s and feeds gestures and measured line
//! heights back in.

pub mod config;
pub mod engine;
pub mod media;
pub mod view;

pub use config::{BlendProfile, EngineConfig, MotionBand, StepBand, StepProfile};
pub use engine::{Engine, EngineEvent, Line, SyncMode, anchor_glyph, resolve_line_index};
pub use media::{MediaController, MediaError, MediaEvent};
pub use view::{SharedViewState, ViewSnapshot};
