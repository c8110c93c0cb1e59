use anyhow::Result;
use sumoprep::{SumoNetwork, backfill_file, generate_road_names, link_file};

use crate::cli::{BackfillArgs, Cli, LinkArgs, MatchEdgesArgs};

pub fn match_edges(cli: &Cli, args: &MatchEdgesArgs) -> Result<()> {
    println!("[match-edges] loading network from {}", args.net.display());
    let network = SumoNetwork::load(&args.net)?;
    if cli.verbose > 0 {
        eprintln!("[match-edges] {} edges loaded", network.len());
    }

    let summary =
        generate_road_names(&args.input, &network, &args.output, args.radius, cli.verbose)?;
    println!(
        "[match-edges] matched {} roads, dropped {} -> {}",
        summary.matched,
        summary.dropped,
        args.output.display()
    );
    Ok(())
}

pub fn backfill(cli: &Cli, args: &BackfillArgs) -> Result<()> {
    let unresolved = backfill_file(&args.roads, cli.verbose)?;
    println!("Roads without edge ID: {unresolved}");
    Ok(())
}

pub fn link(_cli: &Cli, args: &LinkArgs) -> Result<()> {
    let (kept, dropped) = link_file(&args.input, &args.roads, &args.output)?;
    println!("[link] kept {kept} rows, dropped {dropped} -> {}", args.output.display());
    Ok(())
}
