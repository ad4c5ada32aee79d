//! Timed line model and the timeline resolver
//!
//! A timeline is an ordered list of [`Line`]s with ascending timestamps.
//! Lines with blank text are rests: they occupy time but are skipped when
//! looking for something to display or snap to.

/// A single timestamped text line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Start time within one loop, in seconds
    pub time: f64,
    /// Line text; blank for a rest
    pub text: String,
}

impl Line {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }

    /// A rest carries no displayable text.
    pub fn is_rest(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Resolve the line a time value falls on.
///
/// `time` is reduced modulo `max(1, duration)` so absolute (multi-loop)
/// times resolve the same way as display times. Returns the greatest index
/// whose timestamp is at or before the loop time, or `None` when the
/// timeline is empty or the time precedes the first line. Ties go to the
/// latest matching line.
pub fn resolve_line_index(lines: &[Line], time: f64, duration: f64) -> Option<usize> {
    if lines.is_empty() || !time.is_finite() {
        return None;
    }
    let base = duration.max(1.0);
    let loop_time = time % base;

    let mut index = None;
    for (i, line) in lines.iter().enumerate() {
        if line.time <= loop_time {
            index = Some(i);
        } else {
            break;
        }
    }
    index
}

/// Nearest non-rest line at or before `index`.
pub fn nearest_text_at_or_before(lines: &[Line], index: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .take(index.saturating_add(1))
        .rev()
        .find(|(_, line)| !line.is_rest())
        .map(|(i, _)| i)
}

/// First non-rest line in the timeline.
pub fn first_text_line(lines: &[Line]) -> Option<usize> {
    lines.iter().position(|line| !line.is_rest())
}

/// Glyph for the ambient anchor display: first character of the nearest
/// non-rest line at or before the current one, else of the first non-rest
/// line anywhere, else the configured fallback.
pub fn anchor_glyph(lines: &[Line], current: Option<usize>, fallback: char) -> char {
    let candidate = current
        .and_then(|index| nearest_text_at_or_before(lines, index))
        .or_else(|| first_text_line(lines));

    candidate
        .and_then(|index| lines[index].text.trim().chars().next())
        .unwrap_or(fallback)
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

    #[test]
    fn resolves_line_within_loop() {
        let lines = abc_lines();
        assert_eq!(resolve_line_index(&lines, 15.0, 30.0), Some(1));
        assert_eq!(resolve_line_index(&lines, 29.0, 30.0), Some(2));
    }

    #[test]
    fn resolves_across_loop_boundary() {
        let lines = abc_lines();
        // 31 wraps to loop time 1, which lands back on the first line
        assert_eq!(resolve_line_index(&lines, 31.0, 30.0), Some(0));
        assert_eq!(resolve_line_index(&lines, 75.0, 30.0), Some(1));
    }

    #[test]
    fn time_before_first_line_resolves_to_none() {
        let lines = vec![Line::new(5.0, "A"), Line::new(10.0, "B")];
        assert_eq!(resolve_line_index(&lines, 2.0, 30.0), None);
    }

    #[test]
    fn empty_timeline_resolves_to_none() {
        assert_eq!(resolve_line_index(&[], 10.0, 30.0), None);
    }

    #[test]
    fn non_positive_duration_falls_back_to_one_second_base() {
        let lines = abc_lines();
        // With a base of 1 every time reduces into [0, 1), always line 0
        assert_eq!(resolve_line_index(&lines, 123.4, 0.0), Some(0));
    }

    #[test]
    fn ties_resolve_to_the_latest_matching_line() {
        let lines = vec![Line::new(0.0, "A"), Line::new(10.0, "B"), Line::new(10.0, "C")];
        assert_eq!(resolve_line_index(&lines, 10.0, 30.0), Some(2));
    }

    #[test]
    fn resolution_is_non_decreasing_within_a_loop() {
        let lines = abc_lines();
        let mut last = -1_i64;
        let mut t = 0.0;
        while t < 30.0 {
            let index = resolve_line_index(&lines, t, 30.0).map(|i| i as i64).unwrap_or(-1);
            assert!(index >= last, "index regressed at t={t}");
            last = index;
            t += 0.25;
        }
    }

    #[test]
    fn nearest_text_skips_rests() {
        let lines = vec![
            Line::new(0.0, "A"),
            Line::new(10.0, "  "),
            Line::new(20.0, ""),
        ];
        assert_eq!(nearest_text_at_or_before(&lines, 2), Some(0));
        assert_eq!(nearest_text_at_or_before(&lines, 0), Some(0));
    }

    #[test]
    fn anchor_prefers_line_at_or_before_current() {
        let lines = vec![
            Line::new(0.0, "Alpha"),
            Line::new(10.0, ""),
            Line::new(20.0, "Gamma"),
        ];
        assert_eq!(anchor_glyph(&lines, Some(1), '♪'), 'A');
        assert_eq!(anchor_glyph(&lines, Some(2), '♪'), 'G');
    }

    #[test]
    fn anchor_falls_forward_to_first_text_line() {
        // Nothing at or before the current index has text
        let lines = vec![Line::new(0.0, ""), Line::new(10.0, "Beta")];
        assert_eq!(anchor_glyph(&lines, Some(0), '♪'), 'B');
        // Before the first line entirely
        assert_eq!(anchor_glyph(&lines, None, '♪'), 'B');
    }

    #[test]
    fn anchor_uses_fallback_for_textless_timeline() {
        let lines = vec![Line::new(0.0, ""), Line::new(10.0, "   ")];
        assert_eq!(anchor_glyph(&lines, Some(1), '♪'), '♪');
        assert_eq!(anchor_glyph(&[], None, '心'), '心');
    }
}
