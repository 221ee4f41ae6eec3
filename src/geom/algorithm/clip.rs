use crate::geom::{Axis, VtFeature, VtGeometry, VtLineString, VtLinearRing, VtPoint};

/// Importance of points created where a segment crosses a clip line.  Such
/// points are structural and must survive simplification at every zoom.
const CROSSING_IMPORTANCE: f64 = 1.0;

/// Clip `features` to the band `k1 <= coord <= k2` on `axis`.
///
/// `min_all` and `max_all` bound every feature on `axis`; when they already
/// lie inside (or entirely outside) the band the whole set is accepted (or
/// rejected) without touching any geometry.  The band is closed on both
/// ends, so geometry lying exactly on `k1` or `k2` belongs to it.
///
/// Features whose clipped geometry is empty are dropped; the rest keep their
/// properties and id.
pub(crate) fn clip(features: &[VtFeature], k1: f64, k2: f64, axis: Axis, min_all: f64, max_all: f64) -> Vec<VtFeature> {
    debug_assert!(k1 <= k2, "clip band is inverted");

    if min_all >= k1 && max_all <= k2 { return features.to_vec() }
    if max_all < k1 || min_all > k2 { return Vec::new() }

    let clipper = Clipper { k1, k2, axis };
    features.iter()
        .filter_map(|feature| {
            let (min, max) = (feature.bbox().min(axis), feature.bbox().max(axis));
            if min >= k1 && max <= k2 { return Some(feature.clone()) }
            if max < k1 || min > k2 { return None }
            clipper.geometry(feature.geometry()).map(|geometry| feature.with_geometry(geometry))
        })
        .collect()
}

/// Clips individual geometries against one band.
struct Clipper {
    k1: f64,
    k2: f64,
    axis: Axis,
}

impl Clipper {
    #[inline]
    fn contains(&self, p: &VtPoint) -> bool {
        let k = p.get(self.axis);
        k >= self.k1 && k <= self.k2
    }

    /// Clip one geometry; `None` when nothing remains.
    fn geometry(&self, geometry: &VtGeometry) -> Option<VtGeometry> {
        match geometry {
            VtGeometry::Point(p) => self.contains(p).then_some(VtGeometry::Point(*p)),
            VtGeometry::MultiPoint(points) => {
                let points = points.iter().filter(|p| self.contains(p)).copied().collect::<Vec<_>>();
                (!points.is_empty()).then_some(VtGeometry::MultiPoint(points))
            }
            VtGeometry::LineString(line) => {
                let mut slices = Vec::new();
                self.line(line, &mut slices);
                match slices.len() {
                    0 => None,
                    1 => slices.pop().map(VtGeometry::LineString),
                    _ => Some(VtGeometry::MultiLineString(slices)),
                }
            }
            VtGeometry::MultiLineString(lines) => {
                let mut slices = Vec::new();
                lines.iter().for_each(|line| self.line(line, &mut slices));
                (!slices.is_empty()).then_some(VtGeometry::MultiLineString(slices))
            }
            VtGeometry::Polygon(rings) => self.polygon(rings).map(VtGeometry::Polygon),
            VtGeometry::MultiPolygon(polygons) => {
                let polygons = polygons.iter().filter_map(|rings| self.polygon(rings)).collect::<Vec<_>>();
                (!polygons.is_empty()).then_some(VtGeometry::MultiPolygon(polygons))
            }
            VtGeometry::GeometryCollection(geometries) => {
                let geometries = geometries.iter().filter_map(|g| self.geometry(g)).collect::<Vec<_>>();
                (!geometries.is_empty()).then_some(VtGeometry::GeometryCollection(geometries))
            }
        }
    }

    fn polygon(&self, rings: &[VtLinearRing]) -> Option<Vec<VtLinearRing>> {
        let rings = rings.iter().filter_map(|ring| self.ring(ring)).collect::<Vec<_>>();
        (!rings.is_empty()).then_some(rings)
    }

    /// Append the in-band pieces of `line` to `slices`.  Each piece keeps the
    /// length of the whole line.
    fn line(&self, line: &VtLineString, slices: &mut Vec<VtLineString>) {
        let points = &line.points;
        let len = points.len();
        if len < 2 { return }

        let (k1, k2) = (self.k1, self.k2);
        let mut slice = Vec::new();
        let mut cut = |slice: &mut Vec<VtPoint>| {
            let points = std::mem::take(slice);
            if points.len() >= 2 { slices.push(VtLineString { points, dist: line.dist }) }
        };

        for i in 0..len - 1 {
            let (a, b) = (&points[i], &points[i + 1]);
            let (ak, bk) = (a.get(self.axis), b.get(self.axis));
            let last = i == len - 2;

            if ak < k1 {
                if bk > k2 {
                    // ---|-----|-->
                    slice.push(self.intersect(a, b, k1));
                    slice.push(self.intersect(a, b, k2));
                    if !last { cut(&mut slice) }
                } else if bk >= k1 {
                    // ---|-->  |
                    slice.push(self.intersect(a, b, k1));
                    if last { slice.push(*b) }
                }
            } else if ak > k2 {
                if bk < k1 {
                    // <--|-----|---
                    slice.push(self.intersect(a, b, k2));
                    slice.push(self.intersect(a, b, k1));
                    if !last { cut(&mut slice) }
                } else if bk <= k2 {
                    // |  <--|---
                    slice.push(self.intersect(a, b, k2));
                    if last { slice.push(*b) }
                }
            } else {
                slice.push(*a);
                if bk < k1 {
                    // <--|---  |
                    slice.push(self.intersect(a, b, k1));
                    cut(&mut slice);
                } else if bk > k2 {
                    // |  ---|-->
                    slice.push(self.intersect(a, b, k2));
                    cut(&mut slice);
                } else if last {
                    slice.push(*b);
                }
            }
        }

        cut(&mut slice);
    }

    /// Clip a ring, walking its edges and re-closing the result.  The ring
    /// keeps its original area.
    fn ring(&self, ring: &VtLinearRing) -> Option<VtLinearRing> {
        let points = &ring.points;
        let len = points.len();
        if len < 2 { return None }

        let (k1, k2) = (self.k1, self.k2);
        let mut slice = Vec::new();

        for i in 0..len - 1 {
            let (a, b) = (&points[i], &points[i + 1]);
            let (ak, bk) = (a.get(self.axis), b.get(self.axis));
            let last = i == len - 2;

            if ak < k1 {
                if bk >= k1 {
                    slice.push(self.intersect(a, b, k1));
                    if bk > k2 {
                        slice.push(self.intersect(a, b, k2));
                    } else if last {
                        slice.push(*b);
                    }
                }
            } else if ak > k2 {
                if bk <= k2 {
                    slice.push(self.intersect(a, b, k2));
                    if bk < k1 {
                        slice.push(self.intersect(a, b, k1));
                    } else if last {
                        slice.push(*b);
                    }
                }
            } else {
                slice.push(*a);
                if bk < k1 {
                    slice.push(self.intersect(a, b, k1));
                } else if bk > k2 {
                    slice.push(self.intersect(a, b, k2));
                }
            }
        }

        let (&first, &end) = (slice.first()?, slice.last()?);
        if !first.same_position(&end) { slice.push(first) }

        Some(VtLinearRing { points: slice, area: ring.area })
    }

    /// The point where segment `a`-`b` crosses the line `coord == k`.
    ///
    /// Panics if the segment does not cross it; the walks above only call
    /// this for segments with one end on each side.
    fn intersect(&self, a: &VtPoint, b: &VtPoint, k: f64) -> VtPoint {
        let (ak, bk) = (a.get(self.axis), b.get(self.axis));
        assert!(ak != bk && (ak - k) * (bk - k) <= 0.0, "segment does not cross the clip line");

        match self.axis {
            Axis::X => {
                let y = (k - a.x) * (b.y - a.y) / (b.x - a.x) + a.y;
                VtPoint::with_z(k, y, CROSSING_IMPORTANCE)
            }
            Axis::Y => {
                let x = (k - a.y) * (b.x - a.x) / (b.y - a.y) + a.x;
                VtPoint::with_z(x, k, CROSSING_IMPORTANCE)
            }
        }
    }
}
