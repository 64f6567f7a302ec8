// 📐 Position Mapper - date → pixel offset on a column grid
//
// Bars snap to whole columns: an interval start maps to the left edge of the
// column containing it, an interval end to that column's right edge. In year
// mode a bar starting on the 10th therefore starts at the M2 edge. This is a
// deliberate grid alignment, not a rounding bug.
//
// Dates before the first column map to 0; dates after the last column map to
// `columns.len() * column_width` (off-canvas right).

use crate::axis::Column;
use chrono::NaiveDate;

/// Pixel offset of `date` on the grid
///
/// `snap_to_column_end = false` for interval starts, `true` for interval ends.
pub fn map_position(
    date: NaiveDate,
    columns: &[Column],
    column_width: u32,
    snap_to_column_end: bool,
) -> u32 {
    let canvas_end = (columns.len() as u32).saturating_mul(column_width);

    let (Some(first), Some(last)) = (columns.first(), columns.last()) else {
        return 0;
    };

    if date < first.start {
        return 0;
    }
    if date > last.end {
        return canvas_end;
    }

    // Columns are sorted and contiguous: the first column whose end is not
    // before `date` is the one containing it
    let index = columns.partition_point(|c| c.end < date);

    let left = (index as u32).saturating_mul(column_width);
    if snap_to_column_end {
        left.saturating_add(column_width)
    } else {
        left
    }
}

/// Left edge and width of a bar covering [start, end]
///
/// Width is never below one column, so a bar clipped at the canvas edge stays visible.
pub fn bar_geometry(
    start: NaiveDate,
    end: NaiveDate,
    columns: &[Column],
    column_width: u32,
) -> (u32, u32) {
    let left = map_position(start, columns, column_width, false);
    let right = map_position(end, columns, column_width, true);
    let width = right.saturating_sub(left).max(column_width);
    (left, width)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{month_columns, year_columns};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_columns_snap_to_edges() {
        let columns = month_columns(2024, 1, 40).unwrap();

        assert_eq!(map_position(date(2024, 1, 1), &columns, 40, false), 0);
        assert_eq!(map_position(date(2024, 1, 1), &columns, 40, true), 40);
        assert_eq!(map_position(date(2024, 1, 10), &columns, 40, false), 360);
        assert_eq!(map_position(date(2024, 1, 15), &columns, 40, true), 600);
    }

    #[test]
    fn test_out_of_range_dates() {
        let columns = month_columns(2024, 1, 40).unwrap();

        assert_eq!(map_position(date(2023, 12, 31), &columns, 40, false), 0);
        assert_eq!(map_position(date(2023, 12, 31), &columns, 40, true), 0);
        assert_eq!(map_position(date(2024, 2, 1), &columns, 40, false), 31 * 40);
        assert_eq!(map_position(date(2024, 2, 1), &columns, 40, true), 31 * 40);
    }

    #[test]
    fn test_week_buckets_snap() {
        let columns = year_columns(2024, 30).unwrap();

        // Jan 10 sits in Jan M2 (index 1)
        assert_eq!(map_position(date(2024, 1, 10), &columns, 30, false), 30);
        assert_eq!(map_position(date(2024, 1, 10), &columns, 30, true), 60);
        // Feb 29 sits in Feb M4 (index 7)
        assert_eq!(map_position(date(2024, 2, 29), &columns, 30, false), 210);
        assert_eq!(map_position(date(2024, 2, 29), &columns, 30, true), 240);
    }

    #[test]
    fn test_start_never_after_end_for_same_date() {
        let columns = year_columns(2024, 30).unwrap();
        let mut d = date(2023, 12, 25);
        while d <= date(2025, 1, 5) {
            let start = map_position(d, &columns, 30, false);
            let end = map_position(d, &columns, 30, true);
            assert!(start <= end, "snap order broken at {}", d);
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_wide_columns_saturate() {
        let width = 5_000_000;
        let columns = month_columns(2024, 1, width).unwrap();

        assert_eq!(map_position(date(2024, 1, 31), &columns, width, false), 30 * width);
        assert_eq!(map_position(date(2024, 1, 31), &columns, width, true), 31 * width);

        let columns = month_columns(2024, 1, u32::MAX).unwrap();
        assert_eq!(map_position(date(2024, 1, 2), &columns, u32::MAX, true), u32::MAX);
        assert_eq!(map_position(date(2024, 2, 1), &columns, u32::MAX, false), u32::MAX);
        assert_eq!(
            bar_geometry(date(2024, 1, 5), date(2024, 1, 20), &columns, u32::MAX),
            (u32::MAX, u32::MAX)
        );
    }

    #[test]
    fn test_empty_columns_map_to_zero() {
        assert_eq!(map_position(date(2024, 1, 1), &[], 40, true), 0);
    }

    #[test]
    fn test_bar_geometry_clips_to_canvas() {
        let columns = month_columns(2024, 1, 40).unwrap();

        // Starts before January, ends mid-month
        assert_eq!(
            bar_geometry(date(2023, 12, 20), date(2024, 1, 2), &columns, 40),
            (0, 80)
        );
        // Starts mid-month, runs past the end
        assert_eq!(
            bar_geometry(date(2024, 1, 30), date(2024, 2, 10), &columns, 40),
            (29 * 40, 80)
        );
        // Single day
        assert_eq!(
            bar_geometry(date(2024, 1, 5), date(2024, 1, 5), &columns, 40),
            (160, 40)
        );
    }
}
