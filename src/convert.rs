//! Projection of longitude/latitude features into `[0, 1]²` tile space.

use std::sync::Arc;

use geo::{Coord, Geometry, LineString, Polygon};

use crate::{
    feature::{Feature, FeatureId},
    geom::{
        algorithm::{project_x, project_y, simplify},
        VtFeature, VtGeometry, VtLineString, VtLinearRing, VtPoint,
    },
};

/// Project every feature, computing simplification importance with the
/// given tolerance (in projected units).
///
/// Features without geometry, or whose geometry has no usable parts, are
/// skipped.  With `generate_id`, each output feature's id is its index in
/// `features`.
pub(crate) fn convert(features: &[Feature], tolerance: f64, generate_id: bool) -> Vec<VtFeature> {
    features.iter()
        .enumerate()
        .filter_map(|(i, feature)| {
            let geometry = convert_geometry(feature.geometry.as_ref()?, tolerance)?;
            let id = if generate_id { Some(FeatureId::UInt(i as u64)) } else { feature.id.clone() };
            Some(VtFeature::new(geometry, Arc::clone(&feature.properties), id))
        })
        .collect()
}

/// Project one geometry; `None` when it has no points.
pub(crate) fn convert_geometry(geometry: &Geometry<f64>, tolerance: f64) -> Option<VtGeometry> {
    let geometry = match geometry {
        Geometry::Point(p) => VtGeometry::Point(project(p.0)),
        Geometry::MultiPoint(points) => {
            let points = points.iter().map(|p| project(p.0)).collect::<Vec<_>>();
            if points.is_empty() { return None }
            VtGeometry::MultiPoint(points)
        }
        Geometry::Line(line) => VtGeometry::LineString(project_line([line.start, line.end], tolerance)),
        Geometry::LineString(line) => {
            if line.0.is_empty() { return None }
            VtGeometry::LineString(project_line(line.coords().copied(), tolerance))
        }
        Geometry::MultiLineString(lines) => {
            let lines = lines.iter()
                .filter(|line| !line.0.is_empty())
                .map(|line| project_line(line.coords().copied(), tolerance))
                .collect::<Vec<_>>();
            if lines.is_empty() { return None }
            VtGeometry::MultiLineString(lines)
        }
        Geometry::Polygon(polygon) => VtGeometry::Polygon(project_polygon(polygon, tolerance)?),
        Geometry::MultiPolygon(polygons) => {
            let polygons = polygons.iter()
                .filter_map(|polygon| project_polygon(polygon, tolerance))
                .collect::<Vec<_>>();
            if polygons.is_empty() { return None }
            VtGeometry::MultiPolygon(polygons)
        }
        Geometry::Rect(rect) => VtGeometry::Polygon(project_polygon(&rect.to_polygon(), tolerance)?),
        Geometry::Triangle(triangle) => VtGeometry::Polygon(project_polygon(&triangle.to_polygon(), tolerance)?),
        Geometry::GeometryCollection(collection) => {
            let geometries = collection.iter()
                .filter_map(|geometry| convert_geometry(geometry, tolerance))
                .collect::<Vec<_>>();
            if geometries.is_empty() { return None }
            VtGeometry::GeometryCollection(geometries)
        }
    };
    Some(geometry)
}

#[inline]
fn project(coord: Coord<f64>) -> VtPoint { VtPoint::new(project_x(coord.x), project_y(coord.y)) }

fn project_line(coords: impl IntoIterator<Item = Coord<f64>>, tolerance: f64) -> VtLineString {
    let mut line = VtLineString::from_points(coords.into_iter().map(project).collect());
    simplify(&mut line.points, tolerance);
    line
}

fn project_ring(ring: &LineString<f64>, tolerance: f64) -> Option<VtLinearRing> {
    if ring.0.is_empty() { return None }
    let mut ring = VtLinearRing::from_points(ring.coords().copied().map(project).collect());
    simplify(&mut ring.points, tolerance);
    Some(ring)
}

/// Outer ring first; a polygon with an empty outer ring has no parts.
fn project_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Option<Vec<VtLinearRing>> {
    let exterior = project_ring(polygon.exterior(), tolerance)?;
    let interiors = polygon.interiors().iter().filter_map(|ring| project_ring(ring, tolerance));
    Some(std::iter::once(exterior).chain(interiors).collect())
}
