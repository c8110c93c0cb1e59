use anyhow::Result;
use sumoprep::pipeline::{accuracy as accuracy_mod, filters};

use crate::cli::{
    AccuracyArgs, Cli, DailyFilterArgs, FillDirectionsArgs, FilterDatesArgs, ReorderArgs,
};

pub fn accuracy(cli: &Cli, args: &AccuracyArgs) -> Result<()> {
    let kept = accuracy_mod::filter_with_accuracy(
        &args.input,
        &args.accuracy,
        &args.date_column,
        &args.sensor_column,
        &args.output,
        args.percentage,
        cli.verbose,
    )?;
    println!("[accuracy] kept {kept} rows -> {}", args.output.display());
    Ok(())
}

pub fn daily(_cli: &Cli, args: &DailyFilterArgs) -> Result<()> {
    let kept = filters::daily_filter(&args.input, &args.date, &args.output)?;
    println!("[daily-filter] kept {kept} rows for {} -> {}", args.date, args.output.display());
    Ok(())
}

pub fn date_range(_cli: &Cli, args: &FilterDatesArgs) -> Result<()> {
    let kept = filters::filter_date_range(&args.input, &args.start, &args.end, &args.output)?;
    println!(
        "[filter-dates] kept {kept} rows in {}..{} -> {}",
        args.start,
        args.end,
        args.output.display()
    );
    Ok(())
}

pub fn reorder(_cli: &Cli, args: &ReorderArgs) -> Result<()> {
    filters::reorder_by_date(&args.input, &args.output)?;
    println!("[reorder] chronological dataset -> {}", args.output.display());
    Ok(())
}

pub fn fill_directions(_cli: &Cli, args: &FillDirectionsArgs) -> Result<()> {
    let filled = filters::fill_missing_directions(&args.input, &args.column, &args.default)?;
    println!("[fill-directions] repaired {filled} rows in {}", args.input.display());
    Ok(())
}
