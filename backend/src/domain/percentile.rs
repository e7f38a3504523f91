//! Percentile and rounding helpers for delay statistics.
//!
//! Percentiles use linear interpolation between order statistics, the
//! continuous method warehouse engines implement as `PERCENTILE_CONT`.

/// Round to two decimal places, the precision delay metrics report.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Continuous percentile over an ascending-sorted slice.
///
/// `fraction` is the percentile expressed in `0.0..=1.0`. Returns `None`
/// for an empty slice. For `fraction` values that fall between two order
/// statistics the result interpolates linearly between them.
///
/// # Examples
/// ```
/// use backend::domain::percentile::percentile;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(percentile(&sorted, 0.5), Some(2.5));
/// ```
pub fn percentile(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let last = sorted.len() - 1;
    let rank = fraction.clamp(0.0, 1.0) * last as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;
    let lower = *sorted.get(below)?;
    let upper = *sorted.get(above)?;
    Some(lower + (rank - below as f64) * (upper - lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.25, 1.75)]
    #[case(0.5, 2.5)]
    #[case(0.75, 3.25)]
    #[case(0.0, 1.0)]
    #[case(1.0, 4.0)]
    fn interpolates_between_order_statistics(#[case] fraction: f64, #[case] expected: f64) {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, fraction), Some(expected));
    }

    #[rstest]
    fn single_value_is_every_percentile() {
        let sorted = [7.5];
        assert_eq!(percentile(&sorted, 0.25), Some(7.5));
        assert_eq!(percentile(&sorted, 0.75), Some(7.5));
    }

    #[rstest]
    fn empty_input_has_no_percentile() {
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[rstest]
    fn negative_values_are_ordinary_data_points() {
        let sorted = [-4.0, -1.0, 0.5];
        assert_eq!(percentile(&sorted, 0.5), Some(-1.0));
    }

    #[rstest]
    #[case(1.006, 1.01)]
    #[case(-3.456, -3.46)]
    #[case(2.0, 2.0)]
    fn rounds_to_two_decimals(#[case] value: f64, #[case] expected: f64) {
        assert_eq!(round2(value), expected);
    }
}
