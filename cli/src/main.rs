mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands};
use commands::{cluster, tile};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match &cli.command {
        Commands::Tile(args) => tile::run(&cli, args),
        Commands::Cluster(args) => cluster::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
