use std::{path::Path, sync::Arc};

use anyhow::Context;
use geo::{Coord, CoordNum, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{
    error::{Error, Result},
    feature::{Feature, FeatureId, Properties},
    tile::{Tile, TileFeature},
};

fn invalid(message: impl Into<String>) -> Error { Error::InvalidGeoJson(message.into()) }

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read features from a GeoJSON value: a FeatureCollection, a single
/// Feature, or a bare geometry (which becomes one feature with no
/// properties).
pub fn read_features(value: &Value) -> Result<Vec<Feature>> {
    let object = value.as_object().ok_or_else(|| invalid("GeoJSON must be an object"))?;

    match object.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => object.get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("FeatureCollection must have a features array"))?
            .iter()
            .map(|feature| {
                let feature = feature.as_object().ok_or_else(|| invalid("Feature must be an object"))?;
                read_feature(feature)
            })
            .collect(),
        Some("Feature") => Ok(vec![read_feature(object)?]),
        _ => Ok(vec![Feature {
            geometry: Some(read_geometry(object)?),
            properties: Arc::default(),
            id: None,
        }]),
    }
}

/// Parse a GeoJSON document and read its features.
pub fn read_features_from_str(json: &str) -> Result<Vec<Feature>> {
    read_features(&serde_json::from_str(json)?)
}

/// Read features from a GeoJSON file.
pub fn read_features_from_path(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse GeoJSON in {}", path.display()))?;
    read_features(&value).with_context(|| format!("Invalid GeoJSON in {}", path.display()))
}

fn read_feature(object: &Map<String, Value>) -> Result<Feature> {
    let geometry = match object.get("geometry") {
        None | Some(Value::Null) => None,
        Some(Value::Object(geometry)) => Some(read_geometry(geometry)?),
        Some(_) => return Err(invalid("Feature geometry must be an object or null")),
    };

    let properties = match object.get("properties") {
        Some(Value::Object(properties)) => properties.clone(),
        _ => Properties::new(),
    };

    let id = object.get("id").and_then(FeatureId::from_json);

    Ok(Feature { geometry, properties: Arc::new(properties), id })
}

fn read_geometry(object: &Map<String, Value>) -> Result<Geometry<f64>> {
    let ty = object.get("type").and_then(Value::as_str).unwrap_or("null");

    if ty == "GeometryCollection" {
        let geometries = object.get("geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("GeometryCollection must have a geometries property"))?;
        let geometries = geometries.iter()
            .map(|g| read_geometry(g.as_object().ok_or_else(|| invalid("geometry must be an object"))?))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Geometry::GeometryCollection(GeometryCollection(geometries)));
    }

    let coords = object.get("coordinates")
        .ok_or_else(|| invalid(format!("{ty} geometry must have a coordinates property")))?;

    Ok(match ty {
        "Point" => Geometry::Point(Point(read_position(coords)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            read_positions(coords)?.into_iter().map(Point).collect(),
        )),
        "LineString" => Geometry::LineString(LineString::new(read_positions(coords)?)),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            read_array(coords)?.iter().map(|line| read_positions(line).map(LineString::new)).collect::<Result<_>>()?,
        )),
        "Polygon" => Geometry::Polygon(read_polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            read_array(coords)?.iter().map(read_polygon).collect::<Result<_>>()?,
        )),
        _ => return Err(invalid(format!("{ty} is not a valid GeoJSON geometry type"))),
    })
}

fn read_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| invalid("GeoJSON coordinates must be arrays"))
}

/// A `[x, y, ...]` position; extra dimensions are ignored.
fn read_position(value: &Value) -> Result<Coord<f64>> {
    match read_array(value)?.as_slice() {
        [x, y, ..] => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => Err(invalid("GeoJSON position must contain numbers")),
        },
        _ => Err(invalid("GeoJSON position must have at least two elements")),
    }
}

fn read_positions(value: &Value) -> Result<Vec<Coord<f64>>> {
    read_array(value)?.iter().map(read_position).collect()
}

/// Outer ring first; rings are closed if the input leaves them open.
fn read_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = read_array(value)?.iter()
        .map(|ring| read_positions(ring).map(LineString::new))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect()))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Render a tile as a GeoJSON FeatureCollection in tile-local coordinates.
pub fn write_feature_collection(tile: &Tile) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": tile.features.iter().map(tile_feature_to_json).collect::<Vec<_>>(),
    })
}

/// Render longitude/latitude features as a GeoJSON FeatureCollection.
pub fn write_features(features: &[Feature]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features.iter()
            .map(|f| feature_to_json(f.geometry.as_ref(), &f.properties, f.id.as_ref()))
            .collect::<Vec<_>>(),
    })
}

fn tile_feature_to_json(feature: &TileFeature) -> Value {
    feature_to_json(Some(&feature.geometry), &feature.properties, feature.id.as_ref())
}

fn feature_to_json<T: CoordNum + Serialize>(geometry: Option<&Geometry<T>>, properties: &Properties, id: Option<&FeatureId>) -> Value {
    let mut feature = Map::new();
    feature.insert("type".into(), json!("Feature"));
    if let Some(id) = id {
        feature.insert("id".into(), id.to_json());
    }
    feature.insert("geometry".into(), geometry.map_or(Value::Null, geometry_to_json));
    feature.insert("properties".into(), Value::Object(properties.clone()));
    Value::Object(feature)
}

fn geometry_to_json<T: CoordNum + Serialize>(geometry: &Geometry<T>) -> Value {
    fn position<T: CoordNum + Serialize>(c: &Coord<T>) -> Value { json!([c.x, c.y]) }
    fn line<T: CoordNum + Serialize>(l: &LineString<T>) -> Value { l.coords().map(position).collect() }
    fn polygon<T: CoordNum + Serialize>(p: &Polygon<T>) -> Value {
        std::iter::once(p.exterior()).chain(p.interiors()).map(line).collect()
    }

    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(&p.0) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.iter().map(|p| position(&p.0)).collect::<Vec<_>>(),
        }),
        Geometry::Line(l) => json!({ "type": "LineString", "coordinates": [position(&l.start), position(&l.end)] }),
        Geometry::LineString(l) => json!({ "type": "LineString", "coordinates": line(l) }),
        Geometry::MultiLineString(ml) => json!({
            "type": "MultiLineString",
            "coordinates": ml.iter().map(line).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon).collect::<Vec<_>>(),
        }),
        Geometry::Rect(r) => json!({ "type": "Polygon", "coordinates": polygon(&r.to_polygon()) }),
        Geometry::Triangle(t) => json!({ "type": "Polygon", "coordinates": polygon(&t.to_polygon()) }),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.iter().map(geometry_to_json).collect::<Vec<_>>(),
        }),
    }
}
