//! Strict inner join of the measurement table onto the resolved road names.

use std::path::Path;

use ahash::AHashMap;
use anyhow::Result;
use polars::{
    frame::DataFrame,
    prelude::{BooleanChunked, NamedFrom, NewChunkedArray, Series},
};

use crate::io::csv::{read_csv, str_column, write_csv};
use crate::types::{RoadNameRecord, columns};

use super::read_road_names;

/// Joins `df` onto `records` by (road name, exact geopoint string).
///
/// Rows without a resolved record are dropped: this is the gate that keeps
/// unmatchable sensors out of every downstream simulation input. The drop set
/// is decided in a first pass and the filtered frame materialized afterwards.
pub fn link_edge_ids(df: &DataFrame, records: &[RoadNameRecord]) -> Result<DataFrame> {
    let mut by_key: AHashMap<(&str, &str), &str> = AHashMap::new();
    for record in records {
        if let Some(id) = &record.edge_id {
            by_key
                .entry((record.road_name.as_str(), record.point.key()))
                .or_insert(id.as_str());
        }
    }

    let names = str_column(df, columns::ROAD_NAME)?;
    let points = str_column(df, columns::GEOPOINT)?;

    let mut keep = Vec::with_capacity(df.height());
    let mut edge_ids = Vec::new();
    for (name, point) in names.into_iter().zip(points) {
        let id = name.zip(point).and_then(|key| by_key.get(&key).copied());
        keep.push(id.is_some());
        if let Some(id) = id {
            edge_ids.push(id.to_string());
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let mut out = df.filter(&mask)?;
    out.with_column(Series::new(columns::EDGE_ID.into(), edge_ids))?;
    Ok(out)
}

/// File contract: read the measurement table and the road-names table, join,
/// and write the linked result to `output`. Returns (kept, dropped) row counts.
pub fn link_file(input: &Path, roadnames: &Path, output: &Path) -> Result<(usize, usize)> {
    let df = read_csv(input)?;
    let records = read_road_names(roadnames)?;
    let mut linked = link_edge_ids(&df, &records)?;
    let kept = linked.height();
    write_csv(&mut linked, output)?;
    Ok((kept, df.height() - kept))
}

#[cfg(test)]
mod tests {
    use crate::types::GeoPoint;

    use super::*;

    fn record(name: &str, point: &str, edge: Option<&str>) -> RoadNameRecord {
        RoadNameRecord {
            road_name: name.into(),
            point: GeoPoint::parse(point).unwrap(),
            edge_id: edge.map(str::to_string),
        }
    }

    fn sensor_table() -> DataFrame {
        DataFrame::new(vec![
            Series::new(
                columns::ROAD_NAME.into(),
                vec!["Via Rizzoli", "Via Irnerio", "Via Lame"],
            )
            .into(),
            Series::new(
                columns::GEOPOINT.into(),
                vec!["44.49,11.34", "44.50,11.35", "44.51,11.36"],
            )
            .into(),
            Series::new("00:00-01:00".into(), vec!["12", "7", "40"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_only_rows_with_resolved_records() {
        let records = vec![
            record("Via Rizzoli", "44.49,11.34", Some("E1")),
            record("Via Lame", "44.51,11.36", Some("E3")),
        ];
        let out = link_edge_ids(&sensor_table(), &records).unwrap();
        assert_eq!(out.height(), 2);
        let ids = out.column(columns::EDGE_ID).unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("E1"));
        assert_eq!(ids.get(1), Some("E3"));
    }

    #[test]
    fn unresolved_records_do_not_count_as_matches() {
        let records = vec![record("Via Rizzoli", "44.49,11.34", None)];
        let out = link_edge_ids(&sensor_table(), &records).unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn geopoint_join_is_exact_text_match() {
        // Same coordinates, different formatting: no join.
        let records = vec![record("Via Rizzoli", "44.490,11.340", Some("E1"))];
        let out = link_edge_ids(&sensor_table(), &records).unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn first_record_wins_for_duplicate_keys() {
        let records = vec![
            record("Via Rizzoli", "44.49,11.34", Some("E1")),
            record("Via Rizzoli", "44.49,11.34", Some("E9")),
        ];
        let out = link_edge_ids(&sensor_table(), &records).unwrap();
        let ids = out.column(columns::EDGE_ID).unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("E1"));
    }
}
