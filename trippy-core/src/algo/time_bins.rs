//! Fixed-width time bins over seconds since midnight.
//!
//! Indices are not wrapped: with a 60 minute width a trip starting at 25:10
//! lands in bin 25. Callers expecting a 24 bin day have to clamp upstream.

use crate::{Minutes, Seconds};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBinning {
    width: Seconds,
}

impl TimeBinning {
    pub fn minutes(width: Minutes) -> Self {
        Self {
            width: f64::from(width) * 60.0,
        }
    }

    pub fn seconds(width: u32) -> Self {
        Self {
            width: f64::from(width),
        }
    }

    pub fn width(&self) -> Seconds {
        self.width
    }

    /// `floor(time / width)`
    #[allow(clippy::cast_possible_truncation)]
    pub fn index(&self, time: Seconds) -> i64 {
        (time / self.width).floor() as i64
    }

    /// Bin index of an optional time, `None` for missing or non-finite times
    pub fn index_of(&self, time: Option<Seconds>) -> Option<i64> {
        time.filter(|t| t.is_finite()).map(|t| self.index(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_bins() {
        let binning = TimeBinning::minutes(60);
        assert_eq!(binning.index(3661.0), 1);
        assert_eq!(binning.index(3599.9), 0);
        assert_eq!(binning.index(0.0), 0);
    }

    #[test]
    fn no_wraparound_past_midnight() {
        assert_eq!(TimeBinning::minutes(60).index(25.0 * 3600.0), 25);
    }

    #[test]
    fn second_bins() {
        assert_eq!(TimeBinning::seconds(60).index(121.0), 2);
        assert_eq!(TimeBinning::seconds(60).index_of(None), None);
        assert_eq!(TimeBinning::seconds(60).index_of(Some(f64::NAN)), None);
    }
}
