//! Format-specific reading and writing.
//!
//! # Format Modules
//!
//! - `geojson` - GeoJSON input features and tile output

pub mod geojson;
