//! Same-road-name fallback for records the matcher could not resolve.

use std::path::Path;

use anyhow::Result;

use crate::types::RoadNameRecord;

use super::{read_road_names, write_road_names};

/// Copies an edge id onto every unresolved record from the first record (row
/// order) sharing its road name, and returns how many stayed unresolved.
///
/// Previously filled records are visible to later lookups, so a single donor
/// can seed a whole road name. Running the pass twice changes nothing.
pub fn backfill_edge_ids(records: &mut [RoadNameRecord], verbose: u8) -> usize {
    let mut unresolved = 0;
    for i in 0..records.len() {
        if records[i].edge_id.is_some() {
            continue;
        }
        let road_name = records[i].road_name.clone();
        let donor = records
            .iter()
            .find(|r| r.road_name == road_name && r.edge_id.is_some())
            .and_then(|r| r.edge_id.clone());
        match donor {
            Some(id) => {
                if verbose > 1 {
                    eprintln!("[edges::backfill] {road_name:?} <- {id}");
                }
                records[i].edge_id = Some(id);
            }
            None => unresolved += 1,
        }
    }
    unresolved
}

/// File contract: update the road-names file in place, returning the number of
/// records still without an edge id.
pub fn backfill_file(roadnames: &Path, verbose: u8) -> Result<usize> {
    let mut records = read_road_names(roadnames)?;
    let unresolved = backfill_edge_ids(&mut records, verbose);
    write_road_names(&records, roadnames)?;
    Ok(unresolved)
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

    #[test]
    fn fills_from_same_road_name() {
        let mut records = vec![
            record("Main St", "45.0,9.0", None),
            record("Main St", "45.1,9.1", Some("E7")),
        ];
        let unresolved = backfill_edge_ids(&mut records, 0);
        assert_eq!(unresolved, 0);
        assert_eq!(records[0].edge_id.as_deref(), Some("E7"));
        assert_eq!(records[1].edge_id.as_deref(), Some("E7"));
    }

    #[test]
    fn counts_records_without_donor() {
        let mut records = vec![
            record("Via Lame", "44.5,11.3", None),
            record("Via Riva Reno", "44.6,11.4", Some("E2")),
        ];
        assert_eq!(backfill_edge_ids(&mut records, 0), 1);
        assert_eq!(records[0].edge_id, None);
    }

    #[test]
    fn takes_first_donor_in_row_order() {
        let mut records = vec![
            record("Via Lame", "44.5,11.3", None),
            record("Via Lame", "44.6,11.4", Some("E2")),
            record("Via Lame", "44.7,11.5", Some("E9")),
        ];
        backfill_edge_ids(&mut records, 0);
        assert_eq!(records[0].edge_id.as_deref(), Some("E2"));
    }

    #[test]
    fn is_idempotent() {
        let mut once = vec![
            record("Main St", "45.0,9.0", None),
            record("Main St", "45.1,9.1", Some("E7")),
            record("Elm St", "45.2,9.2", None),
        ];
        let first = backfill_edge_ids(&mut once, 0);
        let mut twice = once.clone();
        let second = backfill_edge_ids(&mut twice, 0);
        assert_eq!(once, twice);
        assert_eq!(first, second);
    }
}
