//! Per-frame playback time smoothing
//!
//! Raw clock samples arrive sparsely; the scroll animator needs a smooth
//! per-frame estimate. [`TimeInterpolator`] advances its estimate by the
//! frame delta and pulls it toward the latest sample with a
//! distance-adaptive blend: small gaps are corrected gently, larger gaps
//! faster, and a gap beyond the snap threshold is treated as a seek and
//! resynced in one step.
//!
//! Gap distances are loop-aware: the shorter of the direct difference and
//! the wrap-around difference on a circular domain of one loop duration is
//! always used, so the estimate never chases a whole loop the wrong way
//! when the loop counter and the sample clock disagree for a frame.

use crate::config::BlendProfile;

/// Smoothed absolute playback time.
#[derive(Debug, Default)]
pub struct TimeInterpolator {
    /// Per-frame estimate, in absolute seconds
    current: f64,
    /// Latest raw sample, in absolute seconds
    target: f64,
}

impl TimeInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current smoothed estimate.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Record the latest raw sample.
    pub fn set_target(&mut self, absolute: f64) {
        if absolute.is_finite() && absolute >= 0.0 {
            self.target = absolute;
        }
    }

    /// Hard resync, used for seeks.
    pub fn snap_to(&mut self, absolute: f64) {
        if absolute.is_finite() && absolute >= 0.0 {
            self.target = absolute;
            self.current = absolute;
        }
    }

    /// Advance one frame and return the new estimate.
    ///
    /// While paused the estimate is pinned exactly to the last sample.
    pub fn tick(
        &mut self,
        dt: f64,
        playing: bool,
        duration: f64,
        profile: &BlendProfile,
        snap_threshold: f64,
    ) -> f64 {
        if !playing {
            self.current = self.target;
            return self.current;
        }

        self.current += dt.max(0.0);

        let direct = self.target - self.current;
        let gap = if duration > 0.0 {
            let wrapped = direct - duration * (direct / duration).round();
            if wrapped.abs() < direct.abs() {
                wrapped
            } else {
                direct
            }
        } else {
            direct
        };

        if gap.abs() > snap_threshold {
            self.current = self.target;
        } else {
            self.current += gap * profile.factor_for(gap.abs());
        }

        if !self.current.is_finite() {
            self.current = self.target;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    #[test]
    fn paused_estimate_is_pinned_to_the_sample() {
        let mut interp = TimeInterpolator::new();
        interp.set_target(12.0);
        let value = interp.tick(FRAME, false, 30.0, &BlendProfile::default(), 1.0);
        assert_eq!(value, 12.0);
        // Stays pinned over repeated frames
        assert_eq!(interp.tick(FRAME, false, 30.0, &BlendProfile::default(), 1.0), 12.0);
    }

    #[test]
    fn playing_estimate_advances_between_samples() {
        let mut interp = TimeInterpolator::new();
        interp.snap_to(10.0);
        let profile = BlendProfile::default();
        let mut last = 10.0;
        for _ in 0..10 {
            let value = interp.tick(FRAME, true, 30.0, &profile, 1.0);
            assert!(value > last, "estimate should keep moving forward");
            last = value;
        }
        // Ten frames of advance stay close to the elapsed wall time
        assert!((last - 10.0 - 10.0 * FRAME).abs() < 0.1);
    }

    #[test]
    fn large_gap_snaps_to_the_target() {
        let mut interp = TimeInterpolator::new();
        interp.snap_to(10.0);
        interp.set_target(14.0);
        let value = interp.tick(FRAME, true, 30.0, &BlendProfile::default(), 1.0);
        assert_eq!(value, 14.0);
    }

    #[test]
    fn whole_loop_disagreements_blend_instead_of_snapping() {
        let mut interp = TimeInterpolator::new();
        // Target a whole loop ahead in absolute terms but at the same spot
        // within the loop: the circular gap is tiny, so no hard resync.
        interp.snap_to(10.0);
        interp.set_target(40.1);
        let value = interp.tick(FRAME, true, 30.0, &BlendProfile::default(), 1.0);
        assert!(value < 11.0, "must not jump a whole loop in one frame");
        assert!(value > 10.0);
    }

    #[test]
    fn small_gap_blends_instead_of_snapping() {
        let mut interp = TimeInterpolator::new();
        interp.snap_to(10.0);
        interp.set_target(10.2);
        let value = interp.tick(FRAME, true, 30.0, &BlendProfile::default(), 1.0);
        assert!(value > 10.0 && value < 10.2);
    }

    #[test]
    fn wraparound_distance_takes_the_short_way() {
        let mut interp = TimeInterpolator::new();
        // Estimate just before the seam, sample just after it, but the
        // loop counter has not caught up: the absolute target looks almost
        // a full loop behind.
        interp.snap_to(29.9);
        interp.set_target(0.2);
        let value = interp.tick(FRAME, true, 30.0, &BlendProfile::default(), 1.0);
        // The short way is +0.3, not -29.7: the estimate keeps advancing
        assert!(value > 29.9, "estimate must not rewind a whole loop");
    }

    #[test]
    fn convergence_toward_a_stale_target_is_gentle() {
        let mut interp = TimeInterpolator::new();
        interp.snap_to(10.0);
        interp.set_target(10.0);
        let profile = BlendProfile::default();
        // With no new samples the estimate runs slightly ahead and the
        // correction pulls it back without ever jumping backwards hard.
        let mut previous = 10.0;
        for _ in 0..60 {
            let value = interp.tick(FRAME, true, 30.0, &profile, 1.0);
            assert!(value + 0.05 > previous);
            previous = value;
        }
        assert!((previous - 10.0).abs() < 1.0);
    }

    #[test]
    fn invalid_targets_are_ignored() {
        let mut interp = TimeInterpolator::new();
        interp.snap_to(5.0);
        interp.set_target(f64::NAN);
        interp.set_target(-2.0);
        assert_eq!(interp.tick(FRAME, false, 30.0, &BlendProfile::default(), 1.0), 5.0);
    }
}
