use std::path::PathBuf;

/// Vector tile slicing and point clustering for GeoJSON
#[derive(clap::Parser, Debug)]
#[command(name = "geotiles", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Slice features and print one tile as GeoJSON in tile pixels
    Tile(TileArgs),

    /// Cluster point features and print one tile as GeoJSON in tile pixels
    Cluster(ClusterArgs),
}

/// Tile coordinates shared by both subcommands.
#[derive(clap::Args, Debug)]
pub struct TileCoords {
    /// Input GeoJSON file (FeatureCollection, Feature or geometry)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Tile zoom
    pub z: u8,

    /// Tile column
    pub x: u32,

    /// Tile row
    pub y: u32,

    /// Output file, defaults to stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// JSON options file (camelCase keys); flags below override it
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct TileArgs {
    #[command(flatten)]
    pub coords: TileCoords,

    /// Max zoom to preserve detail on
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Tile extent in integer units
    #[arg(long)]
    pub extent: Option<u16>,

    /// Tile buffer on each side, in tile units
    #[arg(long)]
    pub buffer: Option<u16>,

    /// Simplification tolerance, in tile units
    #[arg(long)]
    pub tolerance: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub coords: TileCoords,

    /// Cluster radius in pixels
    #[arg(long)]
    pub radius: Option<f64>,

    /// Tile extent in pixels
    #[arg(long)]
    pub extent: Option<u32>,

    /// Min zoom to generate clusters on
    #[arg(long)]
    pub min_zoom: Option<u8>,

    /// Max zoom to cluster points on
    #[arg(long)]
    pub max_zoom: Option<u8>,
}
