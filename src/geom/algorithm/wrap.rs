use crate::geom::{Axis, VtFeature};
use super::clip;

/// Duplicate geometry that crosses the antimeridian onto the other side of
/// the world, so that tiles at either edge see it.
///
/// `buffer` is the tile buffer as a fraction of a tile's width.  Geometry in
/// `[-1 - buffer, buffer]` is shifted right by one world and geometry in
/// `[1 - buffer, 2 + buffer]` is shifted left by one world; the original is
/// cut to `[-buffer, 1 + buffer]`.  When nothing lies near either edge the
/// input is returned unchanged.
pub(crate) fn wrap(features: Vec<VtFeature>, buffer: f64) -> Vec<VtFeature> {
    // Out-of-range bounds force a per-feature check instead of a trivial accept.
    let left = clip(&features, -1.0 - buffer, buffer, Axis::X, -1.0, 2.0);
    let right = clip(&features, 1.0 - buffer, 2.0 + buffer, Axis::X, -1.0, 2.0);

    if left.is_empty() && right.is_empty() { return features }

    let center = clip(&features, -buffer, 1.0 + buffer, Axis::X, -1.0, 2.0);

    let mut merged = Vec::with_capacity(left.len() + center.len() + right.len());
    merged.extend(shifted(left, 1.0));
    merged.extend(center);
    merged.extend(shifted(right, -1.0));
    merged
}

fn shifted(mut features: Vec<VtFeature>, offset: f64) -> Vec<VtFeature> {
    features.iter_mut().for_each(|feature| feature.shift_x(offset));
    features
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geom::{VtGeometry, VtLineString, VtPoint};

    fn line(coords: &[(f64, f64)]) -> VtFeature {
        let points = coords.iter().map(|&(x, y)| VtPoint::new(x, y)).collect();
        VtFeature::new(VtGeometry::LineString(VtLineString::from_points(points)), Arc::default(), None)
    }

    #[test]
    fn interior_features_are_untouched() {
        let features = vec![line(&[(0.3, 0.5), (0.7, 0.5)])];
        assert_eq!(wrap(features.clone(), 0.1), features);
    }

    #[test]
    fn crossing_line_is_copied_to_both_sides() {
        let features = vec![line(&[(0.9, 0.5), (1.1, 0.5)])];
        let wrapped = wrap(features, 0.05);

        let ranges = wrapped.iter()
            .map(|f| (f.bbox().min_x, f.bbox().max_x))
            .collect::<Vec<_>>();
        assert_eq!(ranges.len(), 2);
        // Center copy is cut at 1 + buffer; the right copy lands near x = 0.
        assert!((ranges[0].0 - 0.9).abs() < 1e-12 && (ranges[0].1 - 1.05).abs() < 1e-12);
        assert!((ranges[1].0 + 0.05).abs() < 1e-12 && (ranges[1].1 - 0.1).abs() < 1e-12);
    }

    #[test]
    fn feature_near_left_edge_is_copied_right() {
        let features = vec![line(&[(0.01, 0.2), (0.3, 0.2)])];
        let wrapped = wrap(features, 0.05);
        assert_eq!(wrapped.len(), 2);
        assert!((wrapped[0].bbox().min_x - 1.01).abs() < 1e-12);
        assert!((wrapped[0].bbox().max_x - 1.05).abs() < 1e-12);
        assert_eq!(wrapped[1].bbox().min_x, 0.01);
    }
}
