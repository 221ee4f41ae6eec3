use anyhow::{Context, Result};
use geotiles::{io::geojson, ClusterIndex, ClusterOptions};
use tracing::info;

use super::{read_config, write_json};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ClusterArgs) -> Result<()> {
    let coords = &args.coords;

    let mut options = match &coords.config {
        Some(path) => serde_json::from_str::<ClusterOptions>(&read_config(path)?)
            .with_context(|| format!("Invalid cluster options in {}", path.display()))?,
        None => ClusterOptions::default(),
    };
    if let Some(radius) = args.radius { options.radius = radius }
    if let Some(extent) = args.extent { options.extent = extent }
    if let Some(min_zoom) = args.min_zoom { options.min_zoom = min_zoom }
    if let Some(max_zoom) = args.max_zoom { options.max_zoom = max_zoom }

    let features = geojson::read_features_from_path(&coords.input)?;
    info!(features = features.len(), path = %coords.input.display(), "read input");

    let index = ClusterIndex::new(&features, options)?;
    let tile = index.get_tile(coords.z, coords.x, coords.y);
    info!(points = index.num_points(), features = tile.features.len(), "clustered tile");

    write_json(&geojson::write_feature_collection(&tile), coords.output.as_deref())
}
