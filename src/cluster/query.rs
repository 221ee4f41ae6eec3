use std::sync::Arc;

use geo::{Geometry, Point};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    feature::{Feature, FeatureId, Properties},
    geom::algorithm::{project_x, project_y, unproject_x, unproject_y},
    tile::{saturate, Tile, TileFeature},
};
use super::{index::{Cluster, Level}, ClusterIndex};

impl ClusterIndex {
    // -----------------------------------------------------------------------
    // Tiles
    // -----------------------------------------------------------------------

    /// Points and clusters visible in tile `z/x/y`, in tile pixels.
    ///
    /// The query box extends `radius` pixels past each edge so that markers
    /// overlapping the tile are included, and the columns at either edge of
    /// the world also pick up points across the antimeridian.  Zooms outside
    /// the built range use the nearest level.
    pub fn get_tile(&self, z: u8, x: u32, y: u32) -> Tile {
        let Some(level) = self.level(self.limit_zoom(z)) else { return Tile::empty() };

        let z2 = 2f64.powi(i32::from(z));
        let p = self.options.radius / f64::from(self.options.extent);
        let (fx, fy) = (f64::from(x), f64::from(y));
        let top = (fy - p) / z2;
        let bottom = (fy + 1.0 + p) / z2;

        let mut features = Vec::new();
        let ids = level.tree.range((fx - p) / z2, top, (fx + 1.0 + p) / z2, bottom);
        self.add_tile_features(level, ids, fx, fy, z2, &mut features);

        // At z0 the primary query already spans the whole world.
        if z > 0 && x == 0 {
            let ids = level.tree.range(1.0 - p / z2, top, 1.0, bottom);
            self.add_tile_features(level, ids, z2, fy, z2, &mut features);
        }
        if z > 0 && fx == z2 - 1.0 {
            let ids = level.tree.range(0.0, top, p / z2, bottom);
            self.add_tile_features(level, ids, -1.0, fy, z2, &mut features);
        }

        Tile { features, ..Tile::empty() }
    }

    fn add_tile_features(&self, level: &Level, ids: Vec<usize>, tx: f64, ty: f64, z2: f64, out: &mut Vec<TileFeature>) {
        let extent = f64::from(self.options.extent);
        out.extend(ids.into_iter().map(|i| {
            let cluster = &level.clusters[i];
            let x = saturate((extent * (cluster.x * z2 - tx)).round() as i64);
            let y = saturate((extent * (cluster.y * z2 - ty)).round() as i64);

            let (properties, id) = if cluster.is_cluster() {
                (Arc::new(cluster_properties(cluster)), Some(FeatureId::UInt(cluster.id)))
            } else {
                let point = &self.points[cluster.id as usize];
                let id = if self.options.generate_id {
                    Some(FeatureId::UInt(point.index as u64))
                } else {
                    point.feature.id.clone()
                };
                (Arc::clone(&point.feature.properties), id)
            };

            TileFeature { geometry: Geometry::Point(Point::new(x, y)), properties, id }
        }));
    }

    // -----------------------------------------------------------------------
    // Geographic queries
    // -----------------------------------------------------------------------

    /// Points and clusters at `zoom` inside `[west, south, east, north]`
    /// (degrees).  A box with `west > east` crosses the antimeridian.
    pub fn get_clusters(&self, bbox: [f64; 4], zoom: u8) -> Vec<Feature> {
        let [west, south, east, north] = bbox;
        let mut min_lng = (west + 180.0).rem_euclid(360.0) - 180.0;
        let mut max_lng = if east == 180.0 { 180.0 } else { (east + 180.0).rem_euclid(360.0) - 180.0 };
        let min_lat = south.clamp(-90.0, 90.0);
        let max_lat = north.clamp(-90.0, 90.0);

        if east - west >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut clusters = self.get_clusters([min_lng, min_lat, 180.0, max_lat], zoom);
            clusters.extend(self.get_clusters([-180.0, min_lat, max_lng, max_lat], zoom));
            return clusters;
        }

        let Some(level) = self.level(self.limit_zoom(zoom)) else { return Vec::new() };
        level.tree.range(project_x(min_lng), project_y(max_lat), project_x(max_lng), project_y(min_lat))
            .into_iter()
            .map(|i| self.member_feature(&level.clusters[i]))
            .collect()
    }

    /// The points and clusters that `cluster_id` absorbed, one zoom finer.
    pub fn get_children(&self, cluster_id: u64) -> Result<Vec<Feature>> {
        Ok(self.children(cluster_id)?.into_iter().map(|c| self.member_feature(c)).collect())
    }

    /// Up to `limit` original point features under `cluster_id`, skipping
    /// the first `offset`.
    pub fn get_leaves(&self, cluster_id: u64, limit: usize, offset: usize) -> Result<Vec<Feature>> {
        let mut leaves = Vec::new();
        if limit == 0 {
            self.children(cluster_id)?;
            return Ok(leaves);
        }
        self.append_leaves(&mut leaves, cluster_id, limit, offset, 0)?;
        Ok(leaves)
    }

    /// The zoom at which `cluster_id` breaks apart into several markers.
    pub fn get_cluster_expansion_zoom(&self, cluster_id: u64) -> Result<u8> {
        let (_, origin_zoom) = self.decode(cluster_id).ok_or(Error::ClusterNotFound(cluster_id))?;

        let mut cluster_id = cluster_id;
        let mut zoom = origin_zoom - 1;
        while zoom <= self.options.max_zoom {
            let children = self.children(cluster_id)?;
            zoom += 1;
            match children.as_slice() {
                [only] if only.is_cluster() => cluster_id = only.id,
                _ => break,
            }
        }
        Ok(zoom)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Split a cluster id into its origin index and the zoom of the level
    /// holding the origin.
    fn decode(&self, cluster_id: u64) -> Option<(usize, u8)> {
        let offset = cluster_id.checked_sub(self.points.len() as u64)?;
        let zoom = (offset % 32) as u8;
        if zoom == 0 { return None }
        Some((usize::try_from(offset >> 5).ok()?, zoom))
    }

    fn children(&self, cluster_id: u64) -> Result<Vec<&Cluster>> {
        let not_found = || Error::ClusterNotFound(cluster_id);

        let (origin_index, origin_zoom) = self.decode(cluster_id).ok_or_else(not_found)?;
        let level = self.level(origin_zoom).ok_or_else(not_found)?;
        let origin = level.clusters.get(origin_index).ok_or_else(not_found)?;

        let r = self.options.radius / (f64::from(self.options.extent) * 2f64.powi(i32::from(origin_zoom) - 1));
        let children = level.tree.within(origin.x, origin.y, r)
            .into_iter()
            .map(|i| &level.clusters[i])
            .filter(|c| c.parent_id == Some(cluster_id))
            .collect::<Vec<_>>();

        if children.is_empty() { return Err(not_found()) }
        Ok(children)
    }

    fn append_leaves(&self, leaves: &mut Vec<Feature>, cluster_id: u64, limit: usize, offset: usize, mut skipped: usize) -> Result<usize> {
        for child in self.children(cluster_id)? {
            if child.is_cluster() {
                let count = child.num_points as usize;
                if skipped + count <= offset {
                    skipped += count;
                } else {
                    skipped = self.append_leaves(leaves, child.id, limit, offset, skipped)?;
                }
            } else if skipped < offset {
                skipped += 1;
            } else {
                leaves.push(self.points[child.id as usize].feature.clone());
            }

            if leaves.len() >= limit { break }
        }
        Ok(skipped)
    }

    /// A level member as a lon/lat feature: the original feature for a
    /// single point, a synthetic cluster feature otherwise.
    fn member_feature(&self, cluster: &Cluster) -> Feature {
        if !cluster.is_cluster() {
            return self.points[cluster.id as usize].feature.clone();
        }
        Feature {
            geometry: Some(Point::new(unproject_x(cluster.x), unproject_y(cluster.y)).into()),
            properties: Arc::new(cluster_properties(cluster)),
            id: Some(FeatureId::UInt(cluster.id)),
        }
    }
}

fn cluster_properties(cluster: &Cluster) -> Properties {
    let mut properties = Properties::new();
    properties.insert("cluster".into(), Value::Bool(true));
    properties.insert("cluster_id".into(), Value::from(cluster.id));
    properties.insert("point_count".into(), Value::from(cluster.num_points));
    properties.insert("point_count_abbreviated".into(), abbreviate(cluster.num_points));
    properties
}

/// `1234` becomes `"1.2k"`, `15300` becomes `"15k"`; small counts stay numbers.
fn abbreviate(count: u32) -> Value {
    let count = f64::from(count);
    if count >= 10_000.0 {
        Value::from(format!("{}k", (count / 1000.0).round()))
    } else if count >= 1000.0 {
        Value::from(format!("{}k", (count / 100.0).round() / 10.0))
    } else {
        Value::from(count as u32)
    }
}
