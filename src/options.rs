use serde::{Deserialize, Serialize};

use crate::error::{config_bail, Result};

/// Highest zoom a tile index can be built to (tile coordinates stay in `u32`).
pub const MAX_TILE_ZOOM: u8 = 24;

/// Highest cluster zoom; cluster ids pack `zoom + 1` into five bits.
pub const MAX_CLUSTER_ZOOM: u8 = 30;

// ---------------------------------------------------------------------------
// Tile options
// ---------------------------------------------------------------------------

/// Options for slicing features into a pyramid of tiles.
///
/// Field names (de)serialize in camelCase, so a geojson-vt style options
/// object such as `{"maxZoom": 14, "buffer": 64}` loads directly.  Missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TileOptions {
    /// Max zoom to preserve detail on; tiles deeper than this are never produced.
    pub max_zoom: u8,
    /// Max zoom of the tiles generated eagerly at construction.
    pub index_max_zoom: u8,
    /// A tile with fewer points than this is not split during the eager pass.
    pub min_points_to_split: u32,
    /// Simplification tolerance, in tile pixels.
    pub tolerance: f64,
    /// Width and height of a tile in integer tile-local units.
    pub extent: u16,
    /// Extra tile-local units kept around each tile edge.
    pub buffer: u16,
    /// Use each feature's input index as its id.
    pub generate_id: bool,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            max_zoom: 14,
            index_max_zoom: 5,
            min_points_to_split: 100_000,
            tolerance: 3.0,
            extent: 4096,
            buffer: 64,
            generate_id: false,
        }
    }
}

impl TileOptions {
    /// Parse options from a JSON object and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject option combinations that cannot produce a consistent index.
    pub fn validate(&self) -> Result<()> {
        if self.max_zoom > MAX_TILE_ZOOM {
            config_bail!("maxZoom should be in the 0-{MAX_TILE_ZOOM} range, got {}", self.max_zoom);
        }
        if self.index_max_zoom > self.max_zoom {
            config_bail!("indexMaxZoom ({}) must not exceed maxZoom ({})", self.index_max_zoom, self.max_zoom);
        }
        if self.extent == 0 {
            config_bail!("extent must be positive");
        }
        if i32::from(self.extent) + i32::from(self.buffer) > i32::from(i16::MAX) {
            config_bail!("extent + buffer must fit tile coordinates (at most {}), got {}", i16::MAX, u32::from(self.extent) + u32::from(self.buffer));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            config_bail!("tolerance must be a non-negative number, got {}", self.tolerance);
        }
        Ok(())
    }

    /// Squared-distance tolerance used when simplifying at `max_zoom`.
    #[inline]
    pub(crate) fn base_tolerance(&self) -> f64 {
        self.tolerance / (f64::from(self.extent) * f64::from(1u32 << self.max_zoom))
    }

    /// Buffer as a fraction of one tile's width.
    #[inline]
    pub(crate) fn buffer_ratio(&self) -> f64 { f64::from(self.buffer) / f64::from(self.extent) }
}

// ---------------------------------------------------------------------------
// Cluster options
// ---------------------------------------------------------------------------

/// Options for building a hierarchical point-cluster index.
///
/// Field names (de)serialize in camelCase, matching supercluster's options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterOptions {
    /// Min zoom to generate clusters on.
    pub min_zoom: u8,
    /// Max zoom to cluster points on; `max_zoom + 1` holds the raw points.
    pub max_zoom: u8,
    /// Cluster radius in pixels.
    pub radius: f64,
    /// Tile extent in pixels; `radius` is relative to it.
    pub extent: u32,
    /// Minimum number of points needed to form a cluster.
    pub min_points: usize,
    /// Leaf size of the per-zoom KD-trees.
    pub node_size: usize,
    /// Report each unclustered point's input index as its id.
    pub generate_id: bool,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: 16,
            radius: 40.0,
            extent: 512,
            min_points: 2,
            node_size: pointindex::DEFAULT_NODE_SIZE,
            generate_id: false,
        }
    }
}

impl ClusterOptions {
    /// Parse options from a JSON object and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject option combinations that cannot produce a consistent index.
    pub fn validate(&self) -> Result<()> {
        if self.min_zoom > self.max_zoom {
            config_bail!("minZoom ({}) must not exceed maxZoom ({})", self.min_zoom, self.max_zoom);
        }
        if self.max_zoom > MAX_CLUSTER_ZOOM {
            config_bail!("maxZoom should be in the 0-{MAX_CLUSTER_ZOOM} range, got {}", self.max_zoom);
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            config_bail!("radius must be a non-negative number, got {}", self.radius);
        }
        if self.extent == 0 {
            config_bail!("extent must be positive");
        }
        if f64::from(self.extent) + self.radius > f64::from(i16::MAX) {
            config_bail!("extent + radius must fit tile coordinates (at most {}), got {}", i16::MAX, f64::from(self.extent) + self.radius);
        }
        if self.min_points < 2 {
            config_bail!("minPoints must be at least 2, got {}", self.min_points);
        }
        if self.node_size == 0 {
            config_bail!("nodeSize must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_are_valid() {
        assert!(TileOptions::default().validate().is_ok());
        assert!(ClusterOptions::default().validate().is_ok());
    }

    #[test]
    fn tile_options_from_camel_case_json() {
        let options = TileOptions::from_json(r#"{"maxZoom": 20, "extent": 8192, "tolerance": 0}"#).unwrap();
        assert_eq!(options.max_zoom, 20);
        assert_eq!(options.extent, 8192);
        assert_eq!(options.tolerance, 0.0);
        assert_eq!(options.buffer, 64);
    }

    #[test]
    fn inverted_zoom_bounds_are_rejected() {
        let options = ClusterOptions { min_zoom: 5, max_zoom: 3, ..Default::default() };
        assert!(matches!(options.validate(), Err(Error::Config(_))));

        let options = TileOptions { max_zoom: 4, index_max_zoom: 5, ..Default::default() };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn negative_radius_is_rejected() {
        let err = ClusterOptions::from_json(r#"{"radius": -1}"#).unwrap_err();
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn too_deep_zoom_is_rejected() {
        let options = TileOptions { max_zoom: 25, ..Default::default() };
        assert!(options.validate().is_err());
        let options = ClusterOptions { max_zoom: 31, ..Default::default() };
        assert!(options.validate().is_err());
    }

    #[test]
    fn extent_must_fit_tile_coordinates() {
        let options = TileOptions { extent: 40_000, ..Default::default() };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
        let options = TileOptions { extent: 32_703, buffer: 64, ..Default::default() };
        assert!(options.validate().is_ok());
        let options = TileOptions { extent: 32_704, buffer: 64, ..Default::default() };
        assert!(options.validate().is_err());

        let options = ClusterOptions { extent: 32_760, radius: 40.0, ..Default::default() };
        assert!(matches!(options.validate(), Err(Error::Config(_))));
        let options = ClusterOptions { extent: 32_727, radius: 40.0, ..Default::default() };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn base_tolerance_scales_with_zoom_and_extent() {
        let options = TileOptions { max_zoom: 2, tolerance: 8.0, extent: 4, ..Default::default() };
        assert_eq!(options.base_tolerance(), 0.5);
    }
}
