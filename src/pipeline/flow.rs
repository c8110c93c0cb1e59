//! Flow exports: the detector flow file fed to SUMO's route sampler and the
//! column exports consumed by the digital-twin side.

use std::path::Path;
use std::process::Command;

use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result, ensure};
use polars::{
    frame::DataFrame,
    prelude::{BooleanChunked, NamedFrom, NewChunkedArray, Series},
};

use crate::io::csv::{read_csv, str_column, write_csv};
use crate::pipeline::{hour_column, parse_time_slot, slot_vehicle_count};
use crate::types::columns;

/// Writes the raw measurement columns the real-flow consumer expects, with a
/// leading row index.
pub fn write_real_flow(input: &Path, output: &Path) -> Result<()> {
    let df = read_csv(input)?;
    let mut names: Vec<String> =
        vec![columns::DATE.to_string(), columns::SENSOR_CODE.to_string()];
    names.extend((0..24).map(hour_column));
    names.extend(
        [
            columns::ROAD_NAME,
            columns::DIRECTION,
            columns::LONGITUDE,
            columns::LATITUDE,
            columns::GEOPOINT,
            columns::SENSOR_ID,
        ]
        .map(str::to_string),
    );

    let mut out = df.select(names)?;
    let index: Vec<u32> = (0..out.height() as u32).collect();
    out.insert_column(0, Series::new("index".into(), index))?;
    write_csv(&mut out, output)
}

/// Writes the shadow-manager export: the location columns renamed to their
/// English names, one row per (road name, traffic loop id) pair.
pub fn write_shadow_types(input: &Path, output: &Path) -> Result<usize> {
    let df = read_csv(input)?;
    let mut out = df.select([
        columns::NODE_FROM,
        columns::NODE_TO,
        columns::ROAD_NAME,
        columns::DIRECTION,
        columns::LONGITUDE,
        columns::LATITUDE,
        columns::GEOPOINT,
        columns::SENSOR_ID,
        columns::EDGE_ID,
        columns::SENSOR_CODE,
        columns::LEVEL,
    ])?;
    out.set_column_names([
        "StartingPoint",
        "EndPoint",
        "RoadName",
        "Direction",
        "Longitude",
        "Latitude",
        "Geopoint",
        "TrafficLoopID",
        "EdgeID",
        "TrafficLoopCode",
        "TrafficLoopLevel",
    ])?;

    let mask = {
        let names = str_column(&out, "RoadName")?;
        let ids = str_column(&out, "TrafficLoopID")?;
        let mut seen: AHashSet<(String, String)> = AHashSet::new();
        let keep: Vec<bool> = names
            .into_iter()
            .zip(ids)
            .map(|(name, id)| match name.zip(id) {
                Some((name, id)) => seen.insert((name.to_string(), id.to_string())),
                None => false,
            })
            .collect();
        BooleanChunked::from_slice("keep".into(), &keep)
    };
    let mut deduped = out.filter(&mask)?;
    let kept = deduped.height();
    write_csv(&mut deduped, output)?;
    Ok(kept)
}

/// Generates the detector flow file for one date and time slot.
///
/// Speeds come from the traffic-model file, keyed by edge id with a
/// decimal-comma `velocity` column in m/s; the output carries them as km/h,
/// four decimals, decimal comma again. Every measured edge must appear in the
/// model.
pub fn generate_flow(
    input: &Path,
    model: &Path,
    output: &Path,
    date: &str,
    time_slot: &str,
) -> Result<usize> {
    let (first, last) = parse_time_slot(time_slot)?;
    let df = read_csv(input)?;
    let velocities = read_model_velocities(model)?;

    let mut detectors = Vec::new();
    let mut times = Vec::new();
    let mut q_pkw = Vec::new();
    let mut v_pkw = Vec::new();
    {
        let dates = str_column(&df, columns::DATE)?;
        let sensors = str_column(&df, columns::SENSOR_ID)?;
        let edges = str_column(&df, columns::EDGE_ID)?;
        for (row, ((value, sensor), edge)) in dates.into_iter().zip(sensors).zip(edges).enumerate()
        {
            if !value.is_some_and(|d| d.contains(date)) {
                continue;
            }
            let sensor = sensor.context("[pipeline::flow] Row without a sensor id")?;
            let edge = edge.context("[pipeline::flow] Row without an edge id")?;
            let velocity = velocities.get(edge).with_context(|| {
                format!("[pipeline::flow] Traffic model has no entry for edge {edge}")
            })?;
            detectors.push(sensor.to_string());
            times.push(((last - first) * 60) as i64);
            q_pkw.push(slot_vehicle_count(&df, row, first, last)?);
            v_pkw.push(format!("{:.4}", velocity * 3.6).replace('.', ","));
        }
    }

    let rows = detectors.len();
    let zeros = vec![0i64; rows];
    let mut out = DataFrame::new(vec![
        Series::new("Detector".into(), detectors).into(),
        Series::new("Time".into(), times).into(),
        Series::new("qPKW".into(), q_pkw).into(),
        Series::new("qLKW".into(), zeros.clone()).into(),
        Series::new("vPKW".into(), v_pkw).into(),
        Series::new("vLKW".into(), zeros).into(),
    ])?;
    write_csv(&mut out, output)?;
    Ok(rows)
}

/// Runs SUMO's `edgeDataFromFlow.py` over a detector flow file, aggregating
/// the `qPKW` column into an edge-data file.
///
/// Like the detector-mapping wrapper, a failing script is reported but not
/// fatal; a missing output artifact is.
pub fn edge_data_from_flow(
    python: &str,
    script: &Path,
    detectors: &Path,
    flow: &Path,
    output: &Path,
    interval: u32,
    verbose: u8,
) -> Result<()> {
    let result = Command::new(python)
        .arg(script)
        .arg("--detector-file")
        .arg(detectors)
        .arg("--detector-flow-file")
        .arg(flow)
        .arg("--output-file")
        .arg(output)
        .arg("--flow-columns")
        .arg("qPKW")
        .arg("-i")
        .arg(interval.to_string())
        .output()
        .with_context(|| format!("[pipeline::flow] Failed to run {python}"))?;

    if verbose > 0 && !result.stdout.is_empty() {
        eprintln!(
            "[pipeline::flow] edgeDataFromFlow: {}",
            String::from_utf8_lossy(&result.stdout).trim_end()
        );
    }
    if !result.status.success() {
        eprintln!(
            "[pipeline::flow] edgeDataFromFlow failed ({}): {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim_end()
        );
    }
    ensure!(
        output.exists(),
        "[pipeline::flow] edgeDataFromFlow produced no output at {}",
        output.display()
    );
    Ok(())
}

fn read_model_velocities(model: &Path) -> Result<AHashMap<String, f64>> {
    let df = read_csv(model)?;
    let edges = str_column(&df, columns::EDGE_ID)?;
    let speeds = str_column(&df, "velocity")?;
    let mut velocities = AHashMap::with_capacity(df.height());
    for (edge, speed) in edges.into_iter().zip(speeds) {
        let (Some(edge), Some(speed)) = (edge, speed) else { continue };
        let parsed: f64 = speed.replace(',', ".").parse().with_context(|| {
            format!("[pipeline::flow] Invalid velocity {speed:?} for edge {edge}")
        })?;
        velocities.entry(edge.to_string()).or_insert(parsed);
    }
    Ok(velocities)
}
