use anyhow::Result;
use sumoprep::add_zones;

use crate::cli::{Cli, ZonesArgs};

pub fn run(cli: &Cli, args: &ZonesArgs) -> Result<()> {
    let report = add_zones(
        &args.input,
        &args.zones,
        &args.zone_column,
        &args.zone_id_column,
        &args.shape_column,
        cli.verbose,
    )?;
    println!(
        "[zones] {} points contained, {} assigned by nearest centroid -> {}",
        report.contained,
        report.fallback,
        args.input.display()
    );
    Ok(())
}
