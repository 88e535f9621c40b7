//! Selection of a continuous rail segment from raw ways.

use fleetcast_core::geo::{distance_m, polyline_length_m};
use fleetcast_core::{GeoPoint, RoutePath};
use tracing::warn;

/// The way with the greatest polyline length.
pub fn longest_way(ways: &[Vec<GeoPoint>]) -> Option<&[GeoPoint]> {
    ways.iter()
        .filter(|w| w.len() >= 2)
        .max_by(|a, b| polyline_length_m(a).total_cmp(&polyline_length_m(b)))
        .map(Vec::as_slice)
}

/// Index of the point closest to `target`.
pub fn nearest_index(points: &[GeoPoint], target: GeoPoint) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance_m(**a, target).total_cmp(&distance_m(**b, target)))
        .map(|(i, _)| i)
}

/// Stretch of `way` starting at the point nearest `center` and covering
/// `length_m`.
///
/// Extends forward first; points before the start are added only when the
/// way ends before the length is reached. Order along the way is kept.
pub fn extract_segment(way: &[GeoPoint], center: GeoPoint, length_m: f64) -> Vec<GeoPoint> {
    let Some(start) = nearest_index(way, center) else {
        return Vec::new();
    };

    let mut covered = 0.0;
    let mut end = start;
    while end + 1 < way.len() && covered < length_m {
        covered += distance_m(way[end], way[end + 1]);
        end += 1;
    }

    let mut begin = start;
    while begin > 0 && covered < length_m {
        covered += distance_m(way[begin - 1], way[begin]);
        begin -= 1;
    }

    way[begin..=end].to_vec()
}

/// Log every gap longer than `max_jump_m`. Returns the number of gaps.
pub fn check_continuity(path: &RoutePath, max_jump_m: f64) -> usize {
    let jumps = path.jumps_over(max_jump_m);
    for (index, gap_m) in &jumps {
        warn!(
            index,
            gap_m = gap_m.round(),
            max_jump_m,
            "Route has a gap between consecutive points"
        );
    }
    jumps.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Points spaced ~111 m apart heading north along lng 0.
    fn meridian(count: usize) -> Vec<GeoPoint> {
        (0..count)
            .map(|i| GeoPoint::new(i as f64 * 0.001, 0.0))
            .collect()
    }

    #[test]
    fn test_longest_way_selected() {
        let short = meridian(3);
        let long = meridian(10);
        let ways = vec![short, long.clone()];
        assert_eq!(longest_way(&ways), Some(long.as_slice()));
        assert_eq!(longest_way(&[]), None);
    }

    #[test]
    fn test_nearest_index() {
        let way = meridian(10);
        assert_eq!(nearest_index(&way, GeoPoint::new(0.0042, 0.0001)), Some(4));
    }

    #[test]
    fn test_extract_forward_only() {
        let way = meridian(50);
        let segment = extract_segment(&way, GeoPoint::new(0.010, 0.0), 500.0);
        assert_eq!(segment.first(), Some(&way[10]));
        // 5 segments of ~111 m cover 500 m
        assert_eq!(segment.len(), 6);
    }

    #[test]
    fn test_extract_extends_backward_at_way_end() {
        let way = meridian(10);
        let segment = extract_segment(&way, GeoPoint::new(0.008, 0.0), 500.0);
        assert_eq!(segment.last(), Some(&way[9]));
        assert_eq!(segment.first(), Some(&way[4]));
        assert!(polyline_length_m(&segment) >= 500.0);
    }

    #[test]
    fn test_extract_whole_way_when_too_short() {
        let way = meridian(4);
        let segment = extract_segment(&way, GeoPoint::new(0.001, 0.0), 10_000.0);
        assert_eq!(segment, way);
    }

    #[test]
    fn test_check_continuity_counts_gaps() {
        let path = RoutePath::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.001, 0.0),
            GeoPoint::new(0.01, 0.0),
        ])
        .unwrap();
        assert_eq!(check_continuity(&path, 500.0), 1);
        assert_eq!(check_continuity(&path, 2000.0), 0);
    }
}
