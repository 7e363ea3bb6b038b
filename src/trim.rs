//! Sliding-window quality trimming.
//!
//! The window at position `i` averages the 5 scores before and the 5 after
//! `i`, leaving `i` itself out. The read starts at the first position whose
//! window reaches the upper threshold and ends at the last such position
//! before the window first falls below the lower threshold.

use std::ops::RangeInclusive;

/// Scores on each side of the window centre.
pub const HALF_WINDOW: usize = 5;
/// Reads shorter than this are kept whole.
pub const MIN_TRIM_LEN: usize = 2 * HALF_WINDOW + 1;

pub const DEFAULT_UPPER_THRESHOLD: f64 = 24.0;
pub const DEFAULT_LOWER_THRESHOLD: f64 = 15.0;

/// Outcome of [`find_trim_points`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPoints {
    pub start: usize,
    pub end: usize,
    /// False when no window reached the upper threshold; `start..=end` is then
    /// the single base at the scan's first position.
    pub passed: bool,
}

impl TrimPoints {
    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Mean of the 10 scores around `i`, excluding `i`.
fn window_average(scores: &[u8], i: usize) -> f64 {
    let before = &scores[i - HALF_WINDOW..i];
    let after = &scores[i + 1..=i + HALF_WINDOW];
    let sum: u32 = before.iter().chain(after).map(|&q| q as u32).sum();
    sum as f64 / (2 * HALF_WINDOW) as f64
}

/// Finds the high-quality stretch of a read.
///
/// Returns `None` only for an empty read.
pub fn find_trim_points(scores: &[u8], upper: f64, lower: f64) -> Option<TrimPoints> {
    if scores.is_empty() {
        return None;
    }
    if scores.len() < MIN_TRIM_LEN {
        return Some(TrimPoints {
            start: 0,
            end: scores.len() - 1,
            passed: true,
        });
    }

    let mut start = None;
    let mut last_good = HALF_WINDOW;
    for i in HALF_WINDOW..=scores.len() - HALF_WINDOW - 1 {
        let avg = window_average(scores, i);
        match start {
            None => {
                if avg >= upper {
                    start = Some(i);
                    last_good = i;
                }
            }
            Some(_) => {
                if avg >= upper {
                    last_good = i;
                } else if avg < lower {
                    break;
                }
            }
        }
    }

    Some(match start {
        Some(start) => TrimPoints {
            start,
            end: last_good,
            passed: true,
        },
        None => TrimPoints {
            start: HALF_WINDOW,
            end: HALF_WINDOW,
            passed: false,
        },
    })
}

/// Summary of quality values over a range, used for trim previews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityStats {
    pub count: usize,
    pub min: u8,
    pub max: u8,
    pub mean: f64,
    pub median: f64,
}

/// Statistics over `scores[range]`; `None` when the range is empty or out of bounds.
pub fn quality_stats(scores: &[u8], range: RangeInclusive<usize>) -> Option<QualityStats> {
    let slice = scores.get(range)?;
    if slice.is_empty() {
        return None;
    }
    let mut sorted = slice.to_vec();
    sorted.sort_unstable();
    let count = sorted.len();
    let sum: u64 = sorted.iter().map(|&q| q as u64).sum();
    let median = if count % 2 == 1 {
        sorted[count / 2] as f64
    } else {
        (sorted[count / 2 - 1] as f64 + sorted[count / 2] as f64) / 2.0
    };
    Some(QualityStats {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        mean: sum as f64 / count as f64,
        median,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plateau() {
        let scores = [5, 5, 5, 5, 5, 30, 30, 30, 30, 30, 30, 30, 30, 30, 5, 5, 5, 5, 5, 5];
        let points = find_trim_points(&scores, 24.0, 15.0).unwrap();
        assert_eq!(points, TrimPoints { start: 8, end: 10, passed: true });
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn test_short_read_kept_whole() {
        let scores = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let points = find_trim_points(&scores, 24.0, 15.0).unwrap();
        assert_eq!(points, TrimPoints { start: 0, end: 9, passed: true });
        assert_eq!(find_trim_points(&[], 24.0, 15.0), None);
    }

    #[test]
    fn test_never_reaches_upper() {
        let scores = [10u8; 30];
        let points = find_trim_points(&scores, 24.0, 15.0).unwrap();
        assert!(!points.passed);
        assert_eq!(points.range(), 5..=5);
    }

    #[test]
    fn test_fall_off_stops_scan() {
        // Good, then a deep dip, then good again: the second stretch is ignored.
        let mut scores = vec![40u8; 20];
        scores.extend([0u8; 12]);
        scores.extend([40u8; 20]);
        let points = find_trim_points(&scores, 24.0, 15.0).unwrap();
        assert_eq!(points.start, 5);
        assert!(points.end < 20);
    }

    #[test]
    fn test_all_good() {
        let scores = [40u8; 25];
        let points = find_trim_points(&scores, 24.0, 15.0).unwrap();
        assert_eq!(points.range(), 5..=19);
    }

    #[test]
    fn test_stats() {
        let stats = quality_stats(&[10, 40, 20, 30], 0..=3).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 40);
        assert_eq!(stats.mean, 25.0);
        assert_eq!(stats.median, 25.0);

        let stats = quality_stats(&[10, 40, 20, 30], 1..=3).unwrap();
        assert_eq!(stats.median, 30.0);

        assert!(quality_stats(&[1, 2], 1..=5).is_none());
    }
}
