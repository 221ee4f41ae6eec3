use std::sync::Arc;

use crate::feature::{FeatureId, Properties};
use super::BBox;

/// A coordinate axis of projected space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

// ---------------------------------------------------------------------------
// Points and point sequences
// ---------------------------------------------------------------------------

/// A point in projected `[0, 1]²` space with its simplification importance.
///
/// `z` is the squared distance at which the point stops mattering: a tile
/// keeps the point only while its squared tolerance is below `z`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VtPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl VtPoint {
    /// A point with zero importance.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self { Self { x, y, z: 0.0 } }

    /// A point with the given importance.
    #[inline]
    pub fn with_z(x: f64, y: f64, z: f64) -> Self { Self { x, y, z } }

    /// Coordinate on `axis`.
    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis { Axis::X => self.x, Axis::Y => self.y }
    }

    /// Check if two points share both coordinates, ignoring importance.
    #[inline]
    pub fn same_position(&self, other: &Self) -> bool { self.x == other.x && self.y == other.y }
}

/// An open line with its total length cached at ingestion.
///
/// Slices produced by clipping inherit the parent's `dist`, so the
/// visibility of a line is decided by its full length rather than by the
/// piece that survives in one tile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VtLineString {
    pub points: Vec<VtPoint>,
    pub dist: f64,
}

/// A closed ring with its absolute area cached at ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VtLinearRing {
    pub points: Vec<VtPoint>,
    pub area: f64,
}

impl VtLineString {
    /// Build from raw points; `dist` is computed as the Euclidean length.
    pub fn from_points(points: Vec<VtPoint>) -> Self {
        let dist = points.windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum();
        Self { points, dist }
    }
}

impl VtLinearRing {
    /// Build from raw points; `area` is the absolute shoelace area.
    pub fn from_points(points: Vec<VtPoint>) -> Self {
        let twice_area: f64 = points.windows(2)
            .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
            .sum();
        Self { points, area: (twice_area / 2.0).abs() }
    }

    /// Check if the ring's first and last points coincide.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => first.same_position(last),
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Projected geometry.  Polygons are lists of rings, outer ring first.
#[derive(Debug, Clone, PartialEq)]
pub enum VtGeometry {
    Point(VtPoint),
    MultiPoint(Vec<VtPoint>),
    LineString(VtLineString),
    MultiLineString(Vec<VtLineString>),
    Polygon(Vec<VtLinearRing>),
    MultiPolygon(Vec<Vec<VtLinearRing>>),
    GeometryCollection(Vec<VtGeometry>),
}

impl VtGeometry {
    /// Visit every point in order.
    pub fn for_each_point<F: FnMut(&VtPoint)>(&self, f: &mut F) {
        match self {
            Self::Point(p) => f(p),
            Self::MultiPoint(points) => points.iter().for_each(f),
            Self::LineString(line) => line.points.iter().for_each(f),
            Self::MultiLineString(lines) => lines.iter()
                .for_each(|line| line.points.iter().for_each(&mut *f)),
            Self::Polygon(rings) => rings.iter()
                .for_each(|ring| ring.points.iter().for_each(&mut *f)),
            Self::MultiPolygon(polygons) => polygons.iter().flatten()
                .for_each(|ring| ring.points.iter().for_each(&mut *f)),
            Self::GeometryCollection(geometries) => geometries.iter()
                .for_each(|geometry| geometry.for_each_point(&mut *f)),
        }
    }

    /// Visit every point mutably in order.
    pub(crate) fn for_each_point_mut<F: FnMut(&mut VtPoint)>(&mut self, f: &mut F) {
        match self {
            Self::Point(p) => f(p),
            Self::MultiPoint(points) => points.iter_mut().for_each(f),
            Self::LineString(line) => line.points.iter_mut().for_each(f),
            Self::MultiLineString(lines) => lines.iter_mut()
                .for_each(|line| line.points.iter_mut().for_each(&mut *f)),
            Self::Polygon(rings) => rings.iter_mut()
                .for_each(|ring| ring.points.iter_mut().for_each(&mut *f)),
            Self::MultiPolygon(polygons) => polygons.iter_mut().flatten()
                .for_each(|ring| ring.points.iter_mut().for_each(&mut *f)),
            Self::GeometryCollection(geometries) => geometries.iter_mut()
                .for_each(|geometry| geometry.for_each_point_mut(&mut *f)),
        }
    }

    /// Total number of points, counting ring closing points.
    pub fn num_points(&self) -> usize {
        let mut count = 0;
        self.for_each_point(&mut |_| count += 1);
        count
    }

    /// Bounding box of all points.
    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::EMPTY;
        self.for_each_point(&mut |p| bbox.extend(p.x, p.y));
        bbox
    }
}

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

/// A projected feature.  Its bounding box and raw point count are computed
/// once at construction; the feature is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VtFeature {
    geometry: VtGeometry,
    properties: Arc<Properties>,
    id: Option<FeatureId>,
    bbox: BBox,
    num_points: u32,
}

impl VtFeature {
    /// Wrap projected geometry, computing its bounding box and point count.
    pub fn new(geometry: VtGeometry, properties: Arc<Properties>, id: Option<FeatureId>) -> Self {
        let bbox = geometry.bbox();
        let num_points = u32::try_from(geometry.num_points()).unwrap_or(u32::MAX);
        Self { geometry, properties, id, bbox, num_points }
    }

    #[inline] pub fn geometry(&self) -> &VtGeometry { &self.geometry }

    #[inline] pub fn properties(&self) -> &Arc<Properties> { &self.properties }

    #[inline] pub fn id(&self) -> Option<&FeatureId> { self.id.as_ref() }

    #[inline] pub fn bbox(&self) -> &BBox { &self.bbox }

    /// Number of points in the source geometry.
    #[inline] pub fn num_points(&self) -> u32 { self.num_points }

    /// Rebuild with a different geometry, keeping properties and id.
    pub(crate) fn with_geometry(&self, geometry: VtGeometry) -> Self {
        Self::new(geometry, Arc::clone(&self.properties), self.id.clone())
    }

    /// Translate every point (and the bounding box) along X.
    pub(crate) fn shift_x(&mut self, offset: f64) {
        self.geometry.for_each_point_mut(&mut |p| p.x += offset);
        self.bbox.shift_x(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<VtPoint> {
        coords.iter().map(|&(x, y)| VtPoint::new(x, y)).collect()
    }

    #[test]
    fn line_dist_is_euclidean_length() {
        let line = VtLineString::from_points(pts(&[(0.0, 0.0), (3.0, 4.0), (3.0, 0.0)]));
        assert_eq!(line.dist, 9.0);
    }

    #[test]
    fn ring_area_is_absolute() {
        let ccw = VtLinearRing::from_points(pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]));
        let cw = VtLinearRing::from_points(pts(&[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (0.0, 0.0)]));
        assert_eq!(ccw.area, 4.0);
        assert_eq!(cw.area, 4.0);
        assert!(ccw.is_closed());
    }

    #[test]
    fn feature_caches_bbox_and_count() {
        let geometry = VtGeometry::GeometryCollection(vec![
            VtGeometry::Point(VtPoint::new(0.1, 0.9)),
            VtGeometry::LineString(VtLineString::from_points(pts(&[(0.2, 0.2), (0.4, 0.3)]))),
        ]);
        let feature = VtFeature::new(geometry, Arc::default(), None);
        assert_eq!(feature.num_points(), 3);
        assert_eq!(*feature.bbox(), BBox::new(0.1, 0.2, 0.4, 0.9));
    }

    #[test]
    fn shift_moves_points_and_bbox() {
        let mut feature = VtFeature::new(VtGeometry::MultiPoint(pts(&[(0.1, 0.1), (0.2, 0.3)])), Arc::default(), None);
        feature.shift_x(1.0);
        assert_eq!(*feature.bbox(), BBox::new(1.1, 0.1, 1.2, 0.3));
        let VtGeometry::MultiPoint(points) = feature.geometry() else { panic!("not a multipoint") };
        assert_eq!(points[0].x, 1.1);
    }
}
