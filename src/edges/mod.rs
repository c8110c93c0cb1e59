//! Mapping sensor locations onto network edges and carrying the resolved edge
//! ids back onto the measurement table.

use std::path::Path;

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::{NamedFrom, Series}};

use crate::io::csv::{read_csv, str_column, write_csv};
use crate::types::{GeoPoint, RoadNameRecord, columns};

mod backfill;
mod link;
mod matcher;

pub use backfill::{backfill_edge_ids, backfill_file};
pub use link::{link_edge_ids, link_file};
pub use matcher::{MatchSummary, generate_road_names, match_road_edges};

/// Reads a road-names table (`Nome via;geopoint;edge_id`).
pub fn read_road_names(path: &Path) -> Result<Vec<RoadNameRecord>> {
    let df = read_csv(path)?;
    let names = str_column(&df, columns::ROAD_NAME)?;
    let points = str_column(&df, columns::GEOPOINT)?;
    let edges = str_column(&df, columns::EDGE_ID)?;

    let mut records = Vec::with_capacity(df.height());
    for ((name, point), edge) in names.into_iter().zip(points).zip(edges) {
        let name = name.with_context(|| {
            format!("[edges] Empty road name in {}", path.display())
        })?;
        let point = point.with_context(|| {
            format!("[edges] Empty geopoint for road {name:?} in {}", path.display())
        })?;
        records.push(RoadNameRecord {
            road_name: name.to_string(),
            point: GeoPoint::parse(point)?,
            edge_id: edge.filter(|e| !e.is_empty()).map(str::to_string),
        });
    }
    Ok(records)
}

/// Writes a road-names table; unresolved records get an empty edge id cell.
pub fn write_road_names(records: &[RoadNameRecord], path: &Path) -> Result<()> {
    let names: Vec<&str> = records.iter().map(|r| r.road_name.as_str()).collect();
    let points: Vec<&str> = records.iter().map(|r| r.point.key()).collect();
    let edges: Vec<Option<&str>> = records.iter().map(|r| r.edge_id.as_deref()).collect();

    let mut df = DataFrame::new(vec![
        Series::new(columns::ROAD_NAME.into(), names).into(),
        Series::new(columns::GEOPOINT.into(), points).into(),
        Series::new(columns::EDGE_ID.into(), edges).into(),
    ])?;
    write_csv(&mut df, path)
}
