#![doc = "Vector tile slicing and point clustering for GeoJSON features"]
mod cluster;
mod convert;
mod error;
mod feature;
mod geom;
mod index;
mod options;
mod tile;

pub mod io;

#[doc(inline)]
pub use cluster::ClusterIndex;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use feature::{Feature, FeatureId, Properties};

#[doc(inline)]
pub use geom::{algorithm::simplify, Axis, BBox, VtFeature, VtGeometry, VtLineString, VtLinearRing, VtPoint};

#[doc(inline)]
pub use index::TileIndex;

#[doc(inline)]
pub use options::{ClusterOptions, TileOptions, MAX_CLUSTER_ZOOM, MAX_TILE_ZOOM};

#[doc(inline)]
pub use tile::{Tile, TileFeature};
