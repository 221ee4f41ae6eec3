//! Tiles: features transformed into tile-local integer coordinates.

use std::sync::Arc;

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};

use crate::{
    feature::{FeatureId, Properties},
    geom::{BBox, VtFeature, VtGeometry, VtLineString, VtLinearRing, VtPoint},
    options::TileOptions,
};

// ---------------------------------------------------------------------------
// Output tile
// ---------------------------------------------------------------------------

/// A feature in tile-local integer coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFeature {
    pub geometry: Geometry<i16>,
    pub properties: Arc<Properties>,
    pub id: Option<FeatureId>,
}

/// The transformed content of one tile.
///
/// Coordinates run from `-buffer` to `extent + buffer`, with `(0, 0)` at the
/// tile's north-west corner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tile {
    pub features: Vec<TileFeature>,
    /// Points in the source features the tile was built from.
    pub num_points: u32,
    /// Points kept after simplification.
    pub num_simplified: u32,
    /// The tile is fully covered by a single polygon.
    pub is_solid: bool,
}

impl Tile {
    /// A tile with no features.
    pub const fn empty() -> Self {
        Self { features: Vec::new(), num_points: 0, num_simplified: 0, is_solid: false }
    }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }
}

// ---------------------------------------------------------------------------
// Internal tile
// ---------------------------------------------------------------------------

/// A tile as stored in the index: its transformed output plus what is
/// needed to subdivide it later.
#[derive(Debug, Clone)]
pub(crate) struct InternalTile {
    pub(crate) z: u8,
    pub(crate) x: u32,
    pub(crate) y: u32,
    /// Union of the source features' bounding boxes, in projected space.
    pub(crate) bbox: BBox,
    /// Projected features kept for drilling down; `None` once split.
    pub(crate) source: Option<Vec<VtFeature>>,
    pub(crate) tile: Tile,
}

impl InternalTile {
    /// Transform `features` into tile `z/x/y`.
    pub(crate) fn new(features: &[VtFeature], z: u8, x: u32, y: u32, options: &TileOptions) -> Self {
        let z2 = f64::from(1u32 << z);
        let extent = f64::from(options.extent);
        let tolerance = if z == options.max_zoom { 0.0 } else { options.tolerance / (z2 * extent) };

        let mut transform = Transform {
            z2,
            tx: f64::from(x),
            ty: f64::from(y),
            extent,
            tolerance,
            sq_tolerance: tolerance * tolerance,
            num_simplified: 0,
        };

        let mut bbox = BBox::EMPTY;
        let mut num_points = 0u32;
        let mut out = Vec::with_capacity(features.len());
        for feature in features {
            bbox = bbox.union(feature.bbox());
            num_points = num_points.saturating_add(feature.num_points());
            transform.feature(feature.geometry(), feature, &mut out);
        }

        let is_solid = is_solid(features, &transform, i64::from(options.extent), i64::from(options.buffer));

        Self {
            z,
            x,
            y,
            bbox,
            source: None,
            tile: Tile { features: out, num_points, num_simplified: transform.num_simplified, is_solid },
        }
    }
}

/// Check if the only feature is a square covering the buffered tile.  Such
/// tiles look the same at every deeper zoom.
fn is_solid(features: &[VtFeature], transform: &Transform, extent: i64, buffer: i64) -> bool {
    let [feature] = features else { return false };
    let ring = match feature.geometry() {
        VtGeometry::Polygon(rings) if rings.len() == 1 => &rings[0],
        VtGeometry::MultiPolygon(polygons) if polygons.len() == 1 && polygons[0].len() == 1 => &polygons[0][0],
        _ => return false,
    };
    if ring.points.len() != 5 { return false }

    let (lo, hi) = (-buffer, extent + buffer);
    let corners = ring.points.iter().map(|p| transform.pixel(p)).collect::<Vec<_>>();
    let on_edge = |v: i64| v == lo || v == hi;
    corners.iter().all(|&(x, y)| on_edge(x) && on_edge(y))
        && corners.iter().any(|&(x, _)| x == lo) && corners.iter().any(|&(x, _)| x == hi)
        && corners.iter().any(|&(_, y)| y == lo) && corners.iter().any(|&(_, y)| y == hi)
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Maps projected geometry to one tile's integer coordinates, dropping what
/// is too small to see at that zoom.
struct Transform {
    z2: f64,
    tx: f64,
    ty: f64,
    extent: f64,
    tolerance: f64,
    sq_tolerance: f64,
    num_simplified: u32,
}

impl Transform {
    /// Unclamped tile-local coordinates of `p`.
    #[inline]
    fn pixel(&self, p: &VtPoint) -> (i64, i64) {
        (
            ((p.x * self.z2 - self.tx) * self.extent).round() as i64,
            ((p.y * self.z2 - self.ty) * self.extent).round() as i64,
        )
    }

    #[inline]
    fn point(&mut self, p: &VtPoint) -> Coord<i16> {
        self.num_simplified += 1;
        let (x, y) = self.pixel(p);
        Coord { x: saturate(x), y: saturate(y) }
    }

    /// Keep endpoints and every point more important than the tolerance.
    fn points(&mut self, points: &[VtPoint]) -> Vec<Coord<i16>> {
        let last = points.len().saturating_sub(1);
        let sq_tolerance = self.sq_tolerance;
        points.iter()
            .enumerate()
            .filter(|&(i, p)| i == 0 || i == last || p.z > sq_tolerance)
            .map(|(_, p)| self.point(p))
            .collect()
    }

    fn line(&mut self, line: &VtLineString) -> Option<LineString<i16>> {
        (line.dist > self.tolerance).then(|| LineString::new(self.points(&line.points)))
    }

    fn ring(&mut self, ring: &VtLinearRing) -> Option<LineString<i16>> {
        (ring.area > self.sq_tolerance).then(|| LineString::new(self.points(&ring.points)))
    }

    /// Outer ring first; `None` once the outer ring is too small.
    fn polygon(&mut self, rings: &[VtLinearRing]) -> Option<Polygon<i16>> {
        let (outer, inner) = rings.split_first()?;
        let exterior = self.ring(outer)?;
        let interiors = inner.iter().filter_map(|ring| self.ring(ring)).collect();
        Some(Polygon::new(exterior, interiors))
    }

    /// Append the transformed `geometry` of `source` to `out`.  Collections
    /// are flattened into one output feature per member, and multi-geometries
    /// reduced to a single part collapse to that part.
    fn feature(&mut self, geometry: &VtGeometry, source: &VtFeature, out: &mut Vec<TileFeature>) {
        let geometry = match geometry {
            VtGeometry::Point(p) => Some(Geometry::Point(Point(self.point(p)))),
            VtGeometry::MultiPoint(points) => {
                let mut points = points.iter().map(|p| Point(self.point(p))).collect::<Vec<_>>();
                match points.len() {
                    0 => None,
                    1 => points.pop().map(Geometry::Point),
                    _ => Some(Geometry::MultiPoint(MultiPoint::new(points))),
                }
            }
            VtGeometry::LineString(line) => self.line(line).map(Geometry::LineString),
            VtGeometry::MultiLineString(lines) => {
                let mut lines = lines.iter().filter_map(|line| self.line(line)).collect::<Vec<_>>();
                match lines.len() {
                    0 => None,
                    1 => lines.pop().map(Geometry::LineString),
                    _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
                }
            }
            VtGeometry::Polygon(rings) => self.polygon(rings).map(Geometry::Polygon),
            VtGeometry::MultiPolygon(polygons) => {
                let mut polygons = polygons.iter().filter_map(|rings| self.polygon(rings)).collect::<Vec<_>>();
                match polygons.len() {
                    0 => None,
                    1 => polygons.pop().map(Geometry::Polygon),
                    _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
                }
            }
            VtGeometry::GeometryCollection(geometries) => {
                geometries.iter().for_each(|geometry| self.feature(geometry, source, out));
                None
            }
        };

        if let Some(geometry) = geometry {
            out.push(TileFeature {
                geometry,
                properties: Arc::clone(source.properties()),
                id: source.id().cloned(),
            });
        }
    }
}

#[inline]
pub(crate) fn saturate(v: i64) -> i16 { v.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16 }

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<VtPoint> {
        coords.iter().map(|&(x, y)| VtPoint::with_z(x, y, 0.0)).collect()
    }

    fn feature(geometry: VtGeometry) -> VtFeature { VtFeature::new(geometry, Arc::default(), None) }

    fn options() -> TileOptions { TileOptions { max_zoom: 4, extent: 4096, buffer: 64, ..Default::default() } }

    #[test]
    fn point_maps_to_tile_pixels() {
        let features = [feature(VtGeometry::Point(VtPoint::new(0.75, 0.25)))];
        let tile = InternalTile::new(&features, 1, 1, 0, &options()).tile;
        assert_eq!(tile.features.len(), 1);
        assert_eq!(tile.features[0].geometry, Geometry::Point(Point::new(2048, 2048)));
        assert_eq!((tile.num_points, tile.num_simplified), (1, 1));
    }

    #[test]
    fn short_lines_vanish_below_max_zoom() {
        let mut line = VtLineString::from_points(pts(&[(0.5, 0.5), (0.5 + 1e-7, 0.5)]));
        line.points[0].z = 1.0;
        line.points[1].z = 1.0;
        let features = [feature(VtGeometry::LineString(line))];

        assert!(InternalTile::new(&features, 0, 0, 0, &options()).tile.is_empty());
        // No tolerance at max zoom.
        let deep = InternalTile::new(&features, 4, 8, 8, &options()).tile;
        assert_eq!(deep.features.len(), 1);
    }

    #[test]
    fn unimportant_points_are_dropped() {
        let mut points = pts(&[(0.1, 0.1), (0.2, 0.1), (0.3, 0.1)]);
        points[0].z = 1.0;
        points[2].z = 1.0;
        let features = [feature(VtGeometry::LineString(VtLineString::from_points(points)))];

        let tile = InternalTile::new(&features, 0, 0, 0, &options()).tile;
        let Geometry::LineString(line) = &tile.features[0].geometry else { panic!("expected a linestring") };
        assert_eq!(line.0.len(), 2);
        assert_eq!((tile.num_points, tile.num_simplified), (3, 2));
    }

    #[test]
    fn single_part_multi_collapses() {
        let features = [feature(VtGeometry::MultiPoint(pts(&[(0.5, 0.5)])))];
        let tile = InternalTile::new(&features, 0, 0, 0, &options()).tile;
        assert!(matches!(tile.features[0].geometry, Geometry::Point(_)));
    }

    #[test]
    fn collections_flatten_into_features() {
        let features = [feature(VtGeometry::GeometryCollection(vec![
            VtGeometry::Point(VtPoint::new(0.1, 0.1)),
            VtGeometry::Point(VtPoint::new(0.2, 0.2)),
        ]))];
        let tile = InternalTile::new(&features, 0, 0, 0, &options()).tile;
        assert_eq!(tile.features.len(), 2);
    }

    #[test]
    fn buffered_square_is_solid() {
        let b = 64.0 / 4096.0 / 2.0;
        let (lo, hi) = (0.5 - b, 1.0 + b);
        let ring = VtLinearRing::from_points(pts(&[(lo, lo), (hi, lo), (hi, hi), (lo, hi), (lo, lo)]));
        let features = [feature(VtGeometry::Polygon(vec![ring]))];

        let tile = InternalTile::new(&features, 1, 1, 1, &options());
        assert!(tile.tile.is_solid);
        assert!(!InternalTile::new(&features, 1, 0, 0, &options()).tile.is_solid);
    }

    #[test]
    fn bbox_is_union_of_sources() {
        let features = [
            feature(VtGeometry::Point(VtPoint::new(0.1, 0.2))),
            feature(VtGeometry::Point(VtPoint::new(0.3, 0.05))),
        ];
        let tile = InternalTile::new(&features, 0, 0, 0, &options());
        assert_eq!(tile.bbox, BBox::new(0.1, 0.05, 0.3, 0.2));
    }
}
