//! The tile index: a lazily subdivided pyramid of tiles over a feature set.

use std::{collections::{hash_map::Entry, BTreeMap}, time::Instant};

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::{
    convert::convert,
    error::Result,
    feature::Feature,
    geom::{algorithm::{clip, wrap}, Axis, VtFeature},
    options::TileOptions,
    tile::{InternalTile, Tile},
};

/// Returned for every request with no content, including invalid coordinates.
static EMPTY_TILE: Tile = Tile::empty();

/// Pack tile coordinates into one key.  The low five bits hold the zoom, so
/// keys of different zooms never collide.
#[inline]
fn to_id(z: u8, x: u32, y: u32) -> u64 {
    ((1u64 << z) * u64::from(y) + u64::from(x)) * 32 + u64::from(z)
}

/// Tile coordinates of the drill-down target.
type Target = (u8, u32, u32);

/// Slices features into vector tiles on demand.
///
/// Construction projects and simplifies the input once, then eagerly splits
/// tiles down to `index_max_zoom` (or until a tile holds fewer than
/// `min_points_to_split` points).  Deeper tiles are produced the first time
/// they are requested by [`TileIndex::get_tile`] and cached afterwards.
#[derive(Debug)]
pub struct TileIndex {
    options: TileOptions,
    tiles: AHashMap<u64, InternalTile>,
    stats: BTreeMap<u8, u32>,
    total: u32,
}

impl TileIndex {
    /// Build an index over longitude/latitude features.
    pub fn new(features: &[Feature], options: TileOptions) -> Result<Self> {
        options.validate()?;
        let projected = convert(features, options.base_tolerance(), options.generate_id);
        Self::from_projected(projected, options)
    }

    /// Build an index over features already in projected `[0, 1]²` space.
    ///
    /// Line and ring points must already carry simplification importance
    /// (see [`crate::simplify`]); points with zero importance are only kept
    /// at `max_zoom`.
    pub fn from_projected(features: Vec<VtFeature>, options: TileOptions) -> Result<Self> {
        options.validate()?;

        let start = Instant::now();
        let num_features = features.len();
        let features = wrap(features, options.buffer_ratio());

        let mut index = Self { options, tiles: AHashMap::new(), stats: BTreeMap::new(), total: 0 };
        index.split_tile(features, 0, 0, 0, None);

        debug!(
            features = num_features,
            tiles = index.total,
            elapsed = ?start.elapsed(),
            "generated tile index",
        );
        Ok(index)
    }

    #[inline] pub fn options(&self) -> &TileOptions { &self.options }

    /// Number of tiles created so far, including ones created by drill-down.
    #[inline] pub fn total(&self) -> u32 { self.total }

    /// Number of tiles created so far, per zoom.
    #[inline] pub fn stats(&self) -> &BTreeMap<u8, u32> { &self.stats }

    /// Every tile created so far, keyed by `(z, x, y)`, in no particular order.
    pub fn internal_tiles(&self) -> impl Iterator<Item = ((u8, u32, u32), &Tile)> + '_ {
        self.tiles.values().map(|t| ((t.z, t.x, t.y), &t.tile))
    }

    /// Get tile `z/x/y`, building it from its nearest ancestor if needed.
    ///
    /// `x` wraps around the world; `z` beyond `max_zoom` or `y` outside the
    /// zoom's range yields an empty tile.  A tile under a solid ancestor is
    /// that ancestor's tile, since it looks the same at every depth.
    pub fn get_tile(&mut self, z: u8, x: u32, y: u32) -> &Tile {
        if z > self.options.max_zoom { return &EMPTY_TILE }

        let z2 = 1u32 << z;
        if y >= z2 { return &EMPTY_TILE }
        let x = x % z2;

        let id = to_id(z, x, y);
        if self.tiles.contains_key(&id) {
            return self.tiles.get(&id).map_or(&EMPTY_TILE, |t| &t.tile);
        }

        let Some((pz, px, py)) = self.find_parent(z, x, y) else { return &EMPTY_TILE };
        let parent_id = to_id(pz, px, py);

        let parent_solid = self.tiles.get(&parent_id).is_some_and(|t| t.tile.is_solid);
        if parent_solid {
            return self.tiles.get(&parent_id).map_or(&EMPTY_TILE, |t| &t.tile);
        }

        let Some(source) = self.tiles.get_mut(&parent_id).and_then(|t| t.source.take()) else {
            return &EMPTY_TILE;
        };

        trace!(z, x, y, parent_z = pz, parent_x = px, parent_y = py, "drilling down");
        let solid_z = self.split_tile(source, pz, px, py, Some((z, x, y)));

        let id = match solid_z {
            Some(sz) => {
                let shift = z - sz;
                to_id(sz, x >> shift, y >> shift)
            }
            None => id,
        };
        self.tiles.get(&id).map_or(&EMPTY_TILE, |t| &t.tile)
    }

    /// Nearest existing ancestor of `z/x/y`.
    fn find_parent(&self, z: u8, x: u32, y: u32) -> Option<(u8, u32, u32)> {
        (0..z).rev()
            .map(|pz| {
                let shift = z - pz;
                (pz, x >> shift, y >> shift)
            })
            .find(|&(pz, px, py)| self.tiles.contains_key(&to_id(pz, px, py)))
    }

    /// Create `z/x/y` from `features` and split it into quadrants until a
    /// stop condition holds.
    ///
    /// Without a target this is the eager pass bounded by `index_max_zoom`
    /// and `min_points_to_split`.  With a target only the ancestors of that
    /// tile are split; siblings keep their features for later.  Returns the
    /// zoom of the solid tile met on the way to the target, if any.
    fn split_tile(&mut self, features: Vec<VtFeature>, z: u8, x: u32, y: u32, target: Option<Target>) -> Option<u8> {
        let mut solid_z = None;
        let mut stack = vec![(features, z, x, y)];

        while let Some((features, z, x, y)) = stack.pop() {
            let tile = match self.tiles.entry(to_id(z, x, y)) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    *self.stats.entry(z).or_default() += 1;
                    self.total += 1;
                    let tile = InternalTile::new(&features, z, x, y, &self.options);
                    trace!(
                        z, x, y,
                        features = tile.tile.features.len(),
                        points = tile.tile.num_points,
                        simplified = tile.tile.num_simplified,
                        "created tile",
                    );
                    entry.insert(tile)
                }
            };

            if features.is_empty() { continue }

            match target {
                None => {
                    if z == self.options.index_max_zoom || tile.tile.num_points < self.options.min_points_to_split {
                        tile.source = Some(features);
                        continue;
                    }
                }
                Some((cz, cx, cy)) => {
                    if z == self.options.max_zoom { continue }
                    if z == cz {
                        tile.source = Some(features);
                        continue;
                    }
                    let shift = cz - z;
                    if x != cx >> shift || y != cy >> shift {
                        tile.source = Some(features);
                        continue;
                    }
                }
            }

            if tile.tile.is_solid {
                if target.is_some() { solid_z = Some(z) }
                tile.source = Some(features);
                continue;
            }

            tile.source = None;
            let bbox = tile.bbox;

            // Quadrant bands overlap by half a buffer on each side.
            let z2 = f64::from(1u32 << z);
            let p = 0.5 * self.options.buffer_ratio();
            let (fx, fy) = (f64::from(x), f64::from(y));

            let left = clip(&features, (fx - p) / z2, (fx + 0.5 + p) / z2, Axis::X, bbox.min_x, bbox.max_x);
            let right = clip(&features, (fx + 0.5 - p) / z2, (fx + 1.0 + p) / z2, Axis::X, bbox.min_x, bbox.max_x);
            drop(features);

            for (half, cx) in [(left, 2 * x), (right, 2 * x + 1)] {
                let top = clip(&half, (fy - p) / z2, (fy + 0.5 + p) / z2, Axis::Y, bbox.min_y, bbox.max_y);
                let bottom = clip(&half, (fy + 0.5 - p) / z2, (fy + 1.0 + p) / z2, Axis::Y, bbox.min_y, bbox.max_y);
                stack.push((top, z + 1, cx, 2 * y));
                stack.push((bottom, z + 1, cx, 2 * y + 1));
            }
        }

        solid_z
    }
}
