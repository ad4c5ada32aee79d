//! Per-frame scroll animation
//!
//! [`ScrollAnimator`] computes where the view should be for the current
//! interpolated time and eases the visible offset toward it. Offsets are
//! content coordinates at the viewport reference point: the target for a
//! line is simply that line's center in unrolled space.
//!
//! The target tracks time continuously: within a line it blends linearly
//! toward the next line's center by the fractional progress between the
//! two timestamps, and on the last line it blends toward the first line of
//! the next loop with an ease-out cubic so the seam never jumps.

use crate::config::StepProfile;
use crate::engine::layout::LineLayout;
use crate::engine::timeline::{Line, resolve_line_index};

/// Cubic ease-out: fast start, gentle arrival.
pub fn ease_out_cubic(progress: f64) -> f64 {
    let inverse = 1.0 - progress.clamp(0.0, 1.0);
    1.0 - inverse * inverse * inverse
}

/// Target offset for an absolute time, in unrolled content space.
///
/// `None` when no line has started yet or the layout is not measurable;
/// the caller skips the frame and retries on the next one.
pub fn compute_target(
    lines: &[Line],
    layout: &LineLayout,
    time: f64,
    duration: f64,
    min_line_span: f64,
) -> Option<f32> {
    let index = resolve_line_index(lines, time, duration)?;
    let base = duration.max(1.0);
    let loop_time = time % base;
    let loop_number = (time / base).floor() as i64;

    let current = layout.unrolled_center(loop_number, index)?;
    let mut target = current;

    if index + 1 < lines.len() {
        if let Some(next) = layout.unrolled_center(loop_number, index + 1) {
            let span = lines[index + 1].time - lines[index].time;
            if span > min_line_span {
                let progress = ((loop_time - lines[index].time) / span).clamp(0.0, 1.0);
                target += (next - target) * progress as f32;
            }
        }
    } else if let Some(next) = layout.unrolled_center(loop_number + 1, 0) {
        // Last line: ease across the loop seam toward the next repetition
        let span = base - lines[index].time;
        if span > min_line_span {
            let progress = ((loop_time - lines[index].time) / span).clamp(0.0, 1.0);
            target += (next - target) * ease_out_cubic(progress) as f32;
        }
    }

    Some(target)
}

/// Eased scroll position, owned exclusively by the animator.
#[derive(Debug, Default)]
pub struct ScrollAnimator {
    /// Content coordinate currently at the viewport reference point
    offset: f32,
    /// Where the offset is heading
    target: f32,
}

impl ScrollAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Adopt an externally observed offset (the user scrolled the view).
    pub fn force_offset(&mut self, offset: f32) {
        if offset.is_finite() {
            self.offset = offset;
            self.target = offset;
        }
    }

    /// Jump straight to an offset with no easing.
    pub fn snap_to(&mut self, offset: f32) {
        if offset.is_finite() {
            self.offset = offset;
            self.target = offset;
        }
    }

    /// Run one animation frame. Returns true when the offset was written.
    ///
    /// Idles (no movement, loop keeps running) when playback is stopped,
    /// the user holds the lock, fewer than two lines exist, or the layout
    /// cannot resolve a position yet.
    #[allow(clippy::too_many_arguments)]
    pub fn frame(
        &mut self,
        playing: bool,
        locked: bool,
        lines: &[Line],
        layout: &LineLayout,
        time: f64,
        duration: f64,
        min_line_span: f64,
        profile: &StepProfile,
    ) -> bool {
        if !playing || locked || lines.len() < 2 {
            return false;
        }
        let Some(target) = compute_target(lines, layout, time, duration, min_line_span) else {
            return false;
        };
        self.step_toward(target, profile)
    }

    /// Move a distance-adaptive fraction toward the target, capped per
    /// frame, snapping once the remainder drops under the epsilon.
    fn step_toward(&mut self, target: f32, profile: &StepProfile) -> bool {
        self.target = target;
        let distance = target - self.offset;
        if !distance.is_finite() {
            return false;
        }
        if distance == 0.0 {
            return false;
        }
        if distance.abs() <= profile.snap_epsilon {
            self.offset = target;
            return true;
        }
        let step = (distance * profile.factor_for(distance.abs()))
            .clamp(-profile.max_step, profile.max_step);
        self.offset += step;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc_lines() -> Vec<Line> {
        vec![
            Line::new(0.0, "A"),
            Line::new(10.0, "B"),
            Line::new(20.0, "C"),
        ]
    }

    fn measured_layout() -> LineLayout {
        // Centers 20 / 68 / 116, loop height 144
        LineLayout::uniform(3, 40.0, 8.0)
    }

    #[test]
    fn target_centers_the_current_line_at_its_start() {
        let target = compute_target(&abc_lines(), &measured_layout(), 10.0, 30.0, 0.01).unwrap();
        assert!((target - 68.0).abs() < 1e-3);
    }

    #[test]
    fn target_blends_linearly_toward_the_next_line() {
        // Halfway between line 1 (t=10) and line 2 (t=20)
        let target = compute_target(&abc_lines(), &measured_layout(), 15.0, 30.0, 0.01).unwrap();
        assert!((target - 92.0).abs() < 1e-3);
    }

    #[test]
    fn last_line_eases_toward_the_next_loop() {
        let lines = abc_lines();
        let layout = measured_layout();
        let at_start = compute_target(&lines, &layout, 20.0, 30.0, 0.01).unwrap();
        assert!((at_start - 116.0).abs() < 1e-3);

        // Deep into the tail the target approaches the next loop's first line
        let near_end = compute_target(&lines, &layout, 29.9, 30.0, 0.01).unwrap();
        let next_first = 144.0 + 20.0;
        assert!(near_end > 116.0);
        assert!((near_end - next_first).abs() < 2.0);

        // Ease-out front-loads the motion relative to a linear blend
        let midway = compute_target(&lines, &layout, 25.0, 30.0, 0.01).unwrap();
        let linear = 116.0 + (next_first - 116.0) * 0.5;
        assert!(midway > linear);
    }

    #[test]
    fn second_loop_targets_repeat_one_loop_height_down() {
        let target = compute_target(&abc_lines(), &measured_layout(), 45.0, 30.0, 0.01).unwrap();
        assert!((target - (144.0 + 92.0)).abs() < 1e-3);
    }

    #[test]
    fn before_the_first_line_there_is_no_target() {
        let lines = vec![Line::new(5.0, "A"), Line::new(10.0, "B")];
        let layout = LineLayout::uniform(2, 40.0, 8.0);
        assert_eq!(compute_target(&lines, &layout, 2.0, 30.0, 0.01), None);
    }

    #[test]
    fn unmeasured_layout_yields_no_target() {
        let layout = LineLayout::new(8.0);
        assert_eq!(compute_target(&abc_lines(), &layout, 15.0, 30.0, 0.01), None);
    }

    #[test]
    fn near_simultaneous_neighbors_skip_the_blend() {
        let lines = vec![
            Line::new(0.0, "A"),
            Line::new(5.0, "B"),
            Line::new(5.005, "C"),
        ];
        let layout = measured_layout();
        // Resolved on B with C only 5 ms later: below the minimum span, so
        // the target stays centered on B instead of dividing by almost zero
        let target = compute_target(&lines, &layout, 5.002, 30.0, 0.01).unwrap();
        assert!((target - 68.0).abs() < 1e-3);
    }

    #[test]
    fn frame_idles_when_locked_paused_or_sparse() {
        let lines = abc_lines();
        let layout = measured_layout();
        let profile = StepProfile::default();
        let mut animator = ScrollAnimator::new();

        assert!(!animator.frame(false, false, &lines, &layout, 15.0, 30.0, 0.01, &profile));
        assert!(!animator.frame(true, true, &lines, &layout, 15.0, 30.0, 0.01, &profile));
        let single = vec![Line::new(0.0, "A")];
        assert!(!animator.frame(true, false, &single, &layout, 15.0, 30.0, 0.01, &profile));
        assert_eq!(animator.offset(), 0.0);
    }

    #[test]
    fn frame_moves_toward_the_target_and_converges() {
        let lines = abc_lines();
        let layout = measured_layout();
        let profile = StepProfile::default();
        let mut animator = ScrollAnimator::new();

        let mut previous = animator.offset();
        for _ in 0..400 {
            animator.frame(true, false, &lines, &layout, 10.0, 30.0, 0.01, &profile);
            assert!(animator.offset() >= previous);
            previous = animator.offset();
        }
        assert!((animator.offset() - 68.0).abs() < 1e-3, "converged on the line center");
    }

    #[test]
    fn per_frame_step_is_capped() {
        let profile = StepProfile::default();
        let mut animator = ScrollAnimator::new();
        animator.step_toward(10_000.0, &profile);
        assert!(animator.offset() <= profile.max_step + 1e-3);
    }

    #[test]
    fn tiny_remainder_snaps_to_target() {
        let profile = StepProfile::default();
        let mut animator = ScrollAnimator::new();
        animator.snap_to(67.8);
        assert!(animator.step_toward(68.0, &profile));
        assert_eq!(animator.offset(), 68.0);
        // Already there: no write
        assert!(!animator.step_toward(68.0, &profile));
    }

    #[test]
    fn ease_out_cubic_shape() {
        assert!((ease_out_cubic(0.0) - 0.0).abs() < 1e-9);
        assert!((ease_out_cubic(1.0) - 1.0).abs() < 1e-9);
        assert!(ease_out_cubic(0.5) > 0.5);
        // Clamped outside the unit interval
        assert_eq!(ease_out_cubic(-1.0), 0.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }
}
