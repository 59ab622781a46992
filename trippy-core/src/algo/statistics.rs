//! Descriptive statistics over groups of values

use std::collections::BTreeMap;

use serde::Serialize;

/// Summary of a group of values.
///
/// Percentiles interpolate linearly between the closest ranks, `std` is the
/// sample standard deviation and is `None` for groups of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p_5: f64,
    pub p_95: f64,
    pub std: Option<f64>,
}

/// Percentile `p` (0..=100) of an ascending, non-empty slice
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    #[allow(clippy::cast_precision_loss)]
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (lower, upper) = (rank.floor() as usize, rank.ceil() as usize);
    let weight = rank - rank.floor();
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Statistics of `values`, ignoring NaN. `None` if nothing is left.
#[allow(clippy::cast_precision_loss)]
pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let std = (sorted.len() > 1).then(|| {
        let squares = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (squares / (n - 1.0)).sqrt()
    });

    Some(DescriptiveStats {
        mean,
        median: percentile(&sorted, 50.0),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p_5: percentile(&sorted, 5.0),
        p_95: percentile(&sorted, 95.0),
        std,
    })
}

/// Group `(key, value)` pairs and describe each group, in ascending key order.
/// Groups without any usable value are left out.
pub fn describe_groups<K: Ord>(
    values: impl IntoIterator<Item = (K, f64)>,
) -> Vec<(K, DescriptiveStats)> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (key, value) in values {
        groups.entry(key).or_default().push(value);
    }
    groups
        .into_iter()
        .filter_map(|(key, values)| describe(&values).map(|stats| (key, stats)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_value_has_no_deviation() {
        let stats = describe(&[4.2]).unwrap();
        assert_eq!(stats.mean, 4.2);
        assert_eq!(stats.median, 4.2);
        assert_eq!(stats.min, 4.2);
        assert_eq!(stats.max, 4.2);
        assert_eq!(stats.p_5, 4.2);
        assert_eq!(stats.p_95, 4.2);
        assert!(stats.std.is_none());
    }

    #[test]
    fn matches_linear_interpolation() {
        let stats = describe(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(close(stats.mean, 3.0));
        assert!(close(stats.median, 3.0));
        assert!(close(stats.p_5, 1.2));
        assert!(close(stats.p_95, 4.8));
        assert!(close(stats.std.unwrap(), 2.5_f64.sqrt()));
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(
            describe(&[5.0, 1.0, 4.0, 2.0, 3.0]),
            describe(&[1.0, 2.0, 3.0, 4.0, 5.0])
        );
    }

    #[test]
    fn even_count_median_averages_middle_values() {
        let stats = describe(&[1.0, 2.0, 3.0, 10.0]).unwrap();
        assert!(close(stats.median, 2.5));
    }

    #[test]
    fn nan_and_empty_groups_are_skipped() {
        assert!(describe(&[]).is_none());
        assert!(describe(&[f64::NAN]).is_none());
        let groups = describe_groups(vec![("b", 1.0), ("a", 2.0), ("c", f64::NAN), ("a", 4.0)]);
        let keys: Vec<_> = groups.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(close(groups[0].1.mean, 3.0));
    }
}
