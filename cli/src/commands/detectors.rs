use anyhow::Result;
use sumoprep::pipeline::detectors;

use crate::cli::{Cli, InOutArgs, MapDetectorsArgs};

pub fn coordinates(_cli: &Cli, args: &InOutArgs) -> Result<()> {
    let written = detectors::write_detector_coordinates(&args.input, &args.output)?;
    println!("[detectors] {written} detector coordinates -> {}", args.output.display());
    Ok(())
}

pub fn induction_loops(_cli: &Cli, args: &InOutArgs) -> Result<()> {
    let written = detectors::write_induction_loops(&args.input, &args.output)?;
    println!("[detectors] {written} induction loops -> {}", args.output.display());
    Ok(())
}

pub fn map_detectors(cli: &Cli, args: &MapDetectorsArgs) -> Result<()> {
    detectors::map_detectors(
        &args.python,
        &args.script,
        &args.net,
        &args.coordinates,
        &args.det_output,
        &args.output,
        cli.verbose,
    )?;
    println!("[detectors] detector definitions written to {}", args.output.display());
    Ok(())
}
