use anyhow::{Context, Result};
use geotiles::{io::geojson, TileIndex, TileOptions};
use serde_json::json;
use tracing::info;

use super::{read_config, write_json};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::TileArgs) -> Result<()> {
    let coords = &args.coords;

    let mut options = match &coords.config {
        Some(path) => serde_json::from_str::<TileOptions>(&read_config(path)?)
            .with_context(|| format!("Invalid tile options in {}", path.display()))?,
        None => TileOptions::default(),
    };
    if let Some(max_zoom) = args.max_zoom { options.max_zoom = max_zoom }
    if let Some(extent) = args.extent { options.extent = extent }
    if let Some(buffer) = args.buffer { options.buffer = buffer }
    if let Some(tolerance) = args.tolerance { options.tolerance = tolerance }
    // Keep the eager pass within a lowered max zoom.
    options.index_max_zoom = options.index_max_zoom.min(options.max_zoom);

    let features = geojson::read_features_from_path(&coords.input)?;
    info!(features = features.len(), path = %coords.input.display(), "read input");

    let mut index = TileIndex::new(&features, options)?;
    let tile = index.get_tile(coords.z, coords.x, coords.y);

    let mut output = geojson::write_feature_collection(tile);
    output["numPoints"] = json!(tile.num_points);
    output["numSimplified"] = json!(tile.num_simplified);
    output["isSolid"] = json!(tile.is_solid);
    let num_features = tile.features.len();
    info!(features = num_features, tiles = index.total(), "generated tile");

    write_json(&output, coords.output.as_deref())
}
