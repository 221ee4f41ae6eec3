use std::time::Instant;

use geo::Geometry;
use pointindex::KdTree;
use tracing::debug;

use crate::{
    error::Result,
    feature::Feature,
    geom::algorithm::{project_x, project_y},
    options::ClusterOptions,
};

/// A point or cluster at one zoom level, in projected `[0, 1]²` space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Cluster {
    pub(super) x: f64,
    pub(super) y: f64,
    /// Index into the input points when `num_points == 1`, the synthetic
    /// cluster id otherwise.
    pub(super) id: u64,
    /// Id of the cluster that absorbed this one at the next coarser zoom.
    pub(super) parent_id: Option<u64>,
    pub(super) num_points: u32,
}

impl Cluster {
    #[inline] pub(super) fn is_cluster(&self) -> bool { self.num_points > 1 }
}

/// The clusters of one zoom level and the tree over their positions.
/// `tree` reports indices into `clusters`.
#[derive(Debug, Clone)]
pub(super) struct Level {
    pub(super) tree: KdTree,
    pub(super) clusters: Vec<Cluster>,
}

impl Level {
    fn new(clusters: Vec<Cluster>, node_size: usize) -> Self {
        let tree = KdTree::with_node_size(clusters.iter().map(|c| [c.x, c.y]), node_size);
        Self { tree, clusters }
    }
}

/// An input point feature with its position in the input.
#[derive(Debug, Clone)]
pub(super) struct InputPoint {
    pub(super) index: usize,
    pub(super) feature: Feature,
}

/// A hierarchical point-cluster index.
///
/// Built once, bottom-up: level `max_zoom + 1` holds the raw points and each
/// coarser level greedily merges the points of the level below that lie
/// within `radius` pixels of each other.  The index is immutable afterwards
/// and can be shared between threads.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    pub(super) options: ClusterOptions,
    pub(super) points: Vec<InputPoint>,
    /// Levels `min_zoom..=max_zoom + 1`, coarsest first.
    pub(super) levels: Vec<Level>,
}

impl ClusterIndex {
    /// Cluster the point features of `features`.  Features with any other
    /// geometry, or none, are ignored.
    pub fn new(features: &[Feature], options: ClusterOptions) -> Result<Self> {
        options.validate()?;
        let start = Instant::now();

        let points = features.iter()
            .enumerate()
            .filter(|(_, feature)| matches!(feature.geometry, Some(Geometry::Point(_))))
            .map(|(index, feature)| InputPoint { index, feature: feature.clone() })
            .collect::<Vec<_>>();

        let mut clusters = points.iter()
            .enumerate()
            .filter_map(|(i, point)| {
                let Some(Geometry::Point(p)) = &point.feature.geometry else { return None };
                Some(Cluster {
                    x: project_x(p.x()),
                    y: project_y(p.y()),
                    id: i as u64,
                    parent_id: None,
                    num_points: 1,
                })
            })
            .collect::<Vec<_>>();

        let mut levels = Vec::with_capacity(usize::from(options.max_zoom - options.min_zoom) + 2);
        let mut tree = KdTree::with_node_size(clusters.iter().map(|c| [c.x, c.y]), options.node_size);

        for z in (options.min_zoom..=options.max_zoom).rev() {
            let level_start = Instant::now();
            let next = cluster_level(&tree, &mut clusters, z, &options, points.len() as u64);
            debug!(
                zoom = z,
                input = clusters.len(),
                output = next.len(),
                elapsed = ?level_start.elapsed(),
                "clustered zoom level",
            );

            let next_level = Level::new(next, options.node_size);
            levels.push(Level { tree, clusters });
            (tree, clusters) = (next_level.tree, next_level.clusters);
        }
        levels.push(Level { tree, clusters });
        levels.reverse();

        debug!(points = points.len(), levels = levels.len(), elapsed = ?start.elapsed(), "built cluster index");
        Ok(Self { options, points, levels })
    }

    #[inline] pub fn options(&self) -> &ClusterOptions { &self.options }

    /// Number of input point features.
    #[inline] pub fn num_points(&self) -> usize { self.points.len() }

    /// Clamp `zoom` to the range that has a level.
    #[inline]
    pub(super) fn limit_zoom(&self, zoom: u8) -> u8 {
        zoom.clamp(self.options.min_zoom, self.options.max_zoom + 1)
    }

    /// The level for `zoom`, if one was built.
    #[inline]
    pub(super) fn level(&self, zoom: u8) -> Option<&Level> {
        self.levels.get(usize::from(zoom.checked_sub(self.options.min_zoom)?))
    }
}

/// Merge the clusters of the level below `zoom` into the clusters of
/// `zoom`, recording each absorbed cluster's `parent_id` in `clusters`.
///
/// A cluster absorbs every not yet visited neighbour within the zoom's
/// radius once their combined count reaches `min_points`; otherwise it and
/// those neighbours pass through unchanged.  Clusters are visited in array
/// order, so the result depends on input order.
fn cluster_level(tree: &KdTree, clusters: &mut [Cluster], zoom: u8, options: &ClusterOptions, num_input: u64) -> Vec<Cluster> {
    let r = options.radius / (f64::from(options.extent) * 2f64.powi(i32::from(zoom)));
    let mut visited = vec![false; clusters.len()];
    let mut next = Vec::with_capacity(clusters.len());
    let mut neighbors = Vec::new();

    for i in 0..clusters.len() {
        if visited[i] { continue }
        visited[i] = true;

        let Cluster { x, y, num_points: origin_points, .. } = clusters[i];

        neighbors.clear();
        tree.within_with(x, y, r, |id| neighbors.push(id));

        let num_points = neighbors.iter()
            .filter(|&&k| !visited[k])
            .map(|&k| clusters[k].num_points)
            .fold(origin_points, u32::saturating_add);

        if num_points > origin_points && num_points as usize >= options.min_points {
            let id = ((i as u64) << 5) + u64::from(zoom) + 1 + num_input;
            let mut wx = x * f64::from(origin_points);
            let mut wy = y * f64::from(origin_points);

            for &k in &neighbors {
                if visited[k] { continue }
                visited[k] = true;
                let neighbor = &mut clusters[k];
                wx += neighbor.x * f64::from(neighbor.num_points);
                wy += neighbor.y * f64::from(neighbor.num_points);
                neighbor.parent_id = Some(id);
            }

            clusters[i].parent_id = Some(id);
            let total = f64::from(num_points);
            next.push(Cluster { x: wx / total, y: wy / total, id, parent_id: None, num_points });
        } else {
            next.push(Cluster { parent_id: None, ..clusters[i] });

            if num_points > 1 {
                for &k in &neighbors {
                    if visited[k] { continue }
                    visited[k] = true;
                    next.push(Cluster { parent_id: None, ..clusters[k] });
                }
            }
        }
    }

    next
}
