//! Autosync Detection and Column Realignment
//!
//! Sensing-coil samples drift out of phase by a small cyclic offset. The
//! offset is detected from the leading elements of a chunk and corrected by
//! right-rotating every column.

/// Number of leading sensing-coil samples inspected for a phase break
pub const SYNC_WINDOW: usize = 5;

/// Largest representable offset; detected values are clamped into [0, 4]
const MAX_OFFSET: usize = 4;

/// Downsampling keeps indices 3, 7, 11, ...
const DOWNSAMPLE_OFFSET: usize = 3;
const DOWNSAMPLE_STRIDE: usize = 4;

/// Scan the leading window of a sensing-coil column for the first element
/// that differs from its predecessor.
///
/// Returns the clamped index of that element, or `None` when the window is
/// constant (or too short to contain a break) — in which case the previous
/// offset stays in effect.
pub fn detect_offset(sensing: &[i32]) -> Option<usize> {
    let limit = sensing.len().min(SYNC_WINDOW);
    let mut prev = *sensing.first()?;
    for (i, &value) in sensing.iter().enumerate().take(limit) {
        if value != prev {
            return Some(i.min(MAX_OFFSET));
        }
        prev = value;
    }
    None
}

/// Map a detected break index to the next autosync state.
///
/// A break at the last inspected position means the window is already
/// aligned, so the state returns to zero; any earlier break index is the
/// offset itself.
pub fn next_state(detected: usize) -> i32 {
    if detected == MAX_OFFSET {
        0
    } else {
        detected as i32
    }
}

/// Right-rotate a column by `offset` positions: the last `offset % len`
/// elements move to the front, preserving relative order. No-op on an empty
/// column.
pub fn rotate_right<T>(column: &mut [T], offset: usize) {
    if column.is_empty() {
        return;
    }
    column.rotate_right(offset % column.len());
}

/// Keep every fourth element starting at index 3, discarding the rest.
pub fn downsample<T: Copy>(column: &[T]) -> Vec<T> {
    column
        .iter()
        .skip(DOWNSAMPLE_OFFSET)
        .step_by(DOWNSAMPLE_STRIDE)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_at_second_element() {
        assert_eq!(detect_offset(&[7, 9, 9, 9, 9, 9]), Some(1));
    }

    #[test]
    fn test_break_at_last_window_position() {
        assert_eq!(detect_offset(&[7, 7, 7, 7, 9, 9]), Some(4));
        assert_eq!(next_state(4), 0);
    }

    #[test]
    fn test_constant_window_reports_nothing() {
        // The break beyond the window is out of reach.
        assert_eq!(detect_offset(&[7, 7, 7, 7, 7, 9, 9]), None);
        assert_eq!(detect_offset(&[7, 7, 7, 7, 7]), None);
    }

    #[test]
    fn test_short_columns() {
        assert_eq!(detect_offset(&[]), None);
        assert_eq!(detect_offset(&[7]), None);
        assert_eq!(detect_offset(&[7, 7, 9]), Some(2));
    }

    #[test]
    fn test_next_state_passes_small_offsets_through() {
        assert_eq!(next_state(1), 1);
        assert_eq!(next_state(2), 2);
        assert_eq!(next_state(3), 3);
    }

    #[test]
    fn test_rotate_moves_tail_to_front() {
        let mut column: Vec<i32> = (0..10).collect();
        rotate_right(&mut column, 3);
        assert_eq!(column, vec![7, 8, 9, 0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rotate_wraps_and_handles_empty() {
        let mut column = vec![1, 2, 3];
        rotate_right(&mut column, 3);
        assert_eq!(column, vec![1, 2, 3]);

        let mut empty: Vec<i32> = Vec::new();
        rotate_right(&mut empty, 2);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_downsample_of_full_chunk() {
        let column: Vec<i64> = (0..480).collect();
        let kept = downsample(&column);
        assert_eq!(kept.len(), 120);
        assert_eq!(kept[0], 3);
        assert_eq!(kept[1], 7);
        assert_eq!(*kept.last().unwrap(), 479);
    }

    #[test]
    fn test_downsample_of_short_columns() {
        assert!(downsample(&[1, 2, 3]).is_empty());
        assert_eq!(downsample(&[1, 2, 3, 4]), vec![4]);
    }
}
