use anyhow::Result;
use sumoprep::SumoNetwork;
use sumoprep::pipeline::{edge_data as edge_data_mod, flow};

use crate::cli::{Cli, DensityArgs, EdgeDataArgs, EdgeDataFromFlowArgs, FlowArgs, InOutArgs};

pub fn real_flow(_cli: &Cli, args: &InOutArgs) -> Result<()> {
    flow::write_real_flow(&args.input, &args.output)?;
    println!("[real-flow] raw measurement export -> {}", args.output.display());
    Ok(())
}

pub fn shadow_types(_cli: &Cli, args: &InOutArgs) -> Result<()> {
    let kept = flow::write_shadow_types(&args.input, &args.output)?;
    println!("[shadow-types] {kept} traffic loops -> {}", args.output.display());
    Ok(())
}

pub fn generate(_cli: &Cli, args: &FlowArgs) -> Result<()> {
    let rows =
        flow::generate_flow(&args.input, &args.model, &args.output, &args.date, &args.time_slot)?;
    println!(
        "[flow] {rows} detector rows for {} {} -> {}",
        args.date,
        args.time_slot,
        args.output.display()
    );
    Ok(())
}

pub fn edge_data(_cli: &Cli, args: &EdgeDataArgs) -> Result<()> {
    let written = edge_data_mod::write_edge_data(
        &args.input,
        &args.output,
        &args.date,
        &args.time_slot,
        args.duration,
    )?;
    println!("[edge-data] {written} edges -> {}", args.output.display());
    Ok(())
}

pub fn edge_data_from_flow(cli: &Cli, args: &EdgeDataFromFlowArgs) -> Result<()> {
    flow::edge_data_from_flow(
        &args.python,
        &args.script,
        &args.detectors,
        &args.flow,
        &args.output,
        args.interval,
        cli.verbose,
    )?;
    println!("[edge-data-from-flow] edge data written to {}", args.output.display());
    Ok(())
}

pub fn density(cli: &Cli, args: &DensityArgs) -> Result<()> {
    println!("[density] loading network from {}", args.net.display());
    let network = SumoNetwork::load(&args.net)?;
    if cli.verbose > 0 {
        eprintln!("[density] {} edges loaded", network.len());
    }
    let annotated = edge_data_mod::annotate_edge_density(&args.input, &args.output, &network)?;
    println!("[density] annotated {annotated} edges -> {}", args.output.display());
    Ok(())
}
