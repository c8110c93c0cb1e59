mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{detectors, edges, filters, flow, zones};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    match &cli.command {
        Commands::Accuracy(args) => filters::accuracy(&cli, args),
        Commands::MatchEdges(args) => edges::match_edges(&cli, args),
        Commands::Backfill(args) => edges::backfill(&cli, args),
        Commands::Link(args) => edges::link(&cli, args),
        Commands::Zones(args) => zones::run(&cli, args),
        Commands::Detectors(args) => detectors::coordinates(&cli, args),
        Commands::InductionLoops(args) => detectors::induction_loops(&cli, args),
        Commands::MapDetectors(args) => detectors::map_detectors(&cli, args),
        Commands::DailyFilter(args) => filters::daily(&cli, args),
        Commands::FilterDates(args) => filters::date_range(&cli, args),
        Commands::Reorder(args) => filters::reorder(&cli, args),
        Commands::FillDirections(args) => filters::fill_directions(&cli, args),
        Commands::RealFlow(args) => flow::real_flow(&cli, args),
        Commands::ShadowTypes(args) => flow::shadow_types(&cli, args),
        Commands::Flow(args) => flow::generate(&cli, args),
        Commands::EdgeData(args) => flow::edge_data(&cli, args),
        Commands::EdgeDataFromFlow(args) => flow::edge_data_from_flow(&cli, args),
        Commands::Density(args) => flow::density(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
