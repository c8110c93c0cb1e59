//! Snapping (road name, geopoint) pairs to the nearest usable network edge.

use std::path::Path;

use ahash::AHashSet;
use anyhow::Result;
use polars::frame::DataFrame;

use crate::io::csv::{read_csv, str_column};
use crate::network::{EdgeCandidate, NetworkEdge, RoadNetwork};
use crate::types::{GeoPoint, RoadNameRecord, columns};

use super::write_road_names;

/// Outcome counts of a matching pass. `dropped` points had no acceptable edge
/// within the search radius and are absent from the output table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub matched: usize,
    pub dropped: usize,
}

/// Picks the best candidate for `road_name`, nearest first.
///
/// Phase one accepts the first candidate whose name matches exactly
/// (case-insensitive) or whose type is drivable: a same-named edge may be
/// geometrically farther than a pedestrian segment the sensor sits next to.
/// Phase two, reached only when phase one exhausts, settles for the nearest
/// drivable candidate regardless of name.
fn select_candidate(candidates: &mut [EdgeCandidate], road_name: &str) -> Option<NetworkEdge> {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    let wanted = road_name.to_lowercase();

    for cand in candidates.iter() {
        if cand.edge.name.to_lowercase() == wanted || cand.edge.is_drivable() {
            return Some(cand.edge.clone());
        }
    }
    candidates.iter().find(|c| c.edge.is_drivable()).map(|c| c.edge.clone())
}

/// Matches every distinct (road name, geopoint) pair of `df` to a network edge.
///
/// Duplicates are collapsed in row order before querying. Points without an
/// acceptable candidate are counted, not kept.
pub fn match_road_edges<N: RoadNetwork + ?Sized>(
    df: &DataFrame,
    network: &N,
    radius: f64,
    verbose: u8,
) -> Result<(Vec<RoadNameRecord>, MatchSummary)> {
    let names = str_column(df, columns::ROAD_NAME)?;
    let points = str_column(df, columns::GEOPOINT)?;

    let mut seen: AHashSet<(String, String)> = AHashSet::new();
    let mut records = Vec::new();
    let mut summary = MatchSummary::default();

    for (name, raw) in names.into_iter().zip(points) {
        let (Some(name), Some(raw)) = (name, raw) else { continue };
        if !seen.insert((name.to_string(), raw.to_string())) {
            continue;
        }

        let point = GeoPoint::parse(raw)?;
        let (x, y) = network.convert_lon_lat(point.lon, point.lat)?;
        let mut candidates = network.nearest_edges(x, y, radius);

        match select_candidate(&mut candidates, name) {
            Some(edge) => {
                if verbose > 1 {
                    eprintln!("[edges::match] {name:?} at {raw} -> {}", edge.id);
                }
                summary.matched += 1;
                records.push(RoadNameRecord {
                    road_name: name.to_string(),
                    point,
                    edge_id: Some(edge.id),
                });
            }
            None => {
                if verbose > 0 {
                    eprintln!("[edges::match] No suitable edge for {name:?} at {raw}");
                }
                summary.dropped += 1;
            }
        }
    }
    Ok((records, summary))
}

/// File-level contract: read the sensor table, match unique pairs, write the
/// road-names table to `output`.
pub fn generate_road_names<N: RoadNetwork + ?Sized>(
    input: &Path,
    network: &N,
    output: &Path,
    radius: f64,
    verbose: u8,
) -> Result<MatchSummary> {
    let df = read_csv(input)?;
    let (records, summary) = match_road_edges(&df, network, radius, verbose)?;
    write_road_names(&records, output)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use ahash::AHashMap;
    use polars::prelude::{NamedFrom, Series};

    use super::*;

    fn edge(id: &str, name: &str, edge_type: &str) -> NetworkEdge {
        NetworkEdge { id: id.into(), name: name.into(), edge_type: edge_type.into() }
    }

    fn cand(e: NetworkEdge, distance: f64) -> EdgeCandidate {
        EdgeCandidate { edge: e, distance }
    }

    /// Answers every query with the same canned candidate list.
    struct FixedNetwork(Vec<EdgeCandidate>);

    impl RoadNetwork for FixedNetwork {
        fn nearest_edges(&self, _x: f64, _y: f64, _radius: f64) -> Vec<EdgeCandidate> {
            self.0.clone()
        }

        fn edge_lengths(&self) -> AHashMap<String, f64> {
            AHashMap::new()
        }

        fn convert_lon_lat(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
            Ok((lon, lat))
        }
    }

    #[test]
    fn nearest_candidate_wins_when_drivable() {
        let mut cands = vec![
            cand(edge("E2", "Via Zamboni", "highway.residential"), 8.0),
            cand(edge("E1", "Via Irnerio", "highway.residential"), 3.0),
        ];
        let chosen = select_candidate(&mut cands, "Via Rizzoli").unwrap();
        assert_eq!(chosen.id, "E1");
    }

    #[test]
    fn name_match_beats_closer_non_drivable() {
        let mut cands = vec![
            cand(edge("W1", "", "highway.footway"), 1.0),
            cand(edge("E1", "Via Rizzoli", "highway.cycleway"), 5.0),
        ];
        let chosen = select_candidate(&mut cands, "via rizzoli").unwrap();
        assert_eq!(chosen.id, "E1");
    }

    #[test]
    fn falls_back_to_nearest_drivable() {
        let mut cands = vec![
            cand(edge("W1", "", "highway.steps"), 1.0),
            cand(edge("E1", "Via Saragozza", "highway.residential"), 4.0),
            cand(edge("E2", "Via Saffi", "highway.primary"), 9.0),
        ];
        let chosen = select_candidate(&mut cands, "Via Marconi").unwrap();
        assert_eq!(chosen.id, "E1");
    }

    #[test]
    fn all_non_drivable_yields_nothing() {
        let mut cands = vec![
            cand(edge("W1", "", "highway.pedestrian"), 1.0),
            cand(edge("W2", "", "highway.path"), 2.0),
        ];
        assert!(select_candidate(&mut cands, "Via Marconi").is_none());
    }

    #[test]
    fn drops_points_without_candidates_and_collapses_duplicates() {
        let df = DataFrame::new(vec![
            Series::new(
                columns::ROAD_NAME.into(),
                vec!["Via Rizzoli", "Via Rizzoli", "Via Irnerio"],
            )
            .into(),
            Series::new(
                columns::GEOPOINT.into(),
                vec!["44.49,11.34", "44.49,11.34", "44.50,11.35"],
            )
            .into(),
        ])
        .unwrap();

        let network = FixedNetwork(vec![]);
        let (records, summary) = match_road_edges(&df, &network, 25.0, 0).unwrap();
        assert!(records.is_empty());
        // Two unique pairs, both dropped; the duplicate row is not double-counted.
        assert_eq!(summary, MatchSummary { matched: 0, dropped: 2 });
    }

    #[test]
    fn matched_records_reference_returned_edges() {
        let df = DataFrame::new(vec![
            Series::new(columns::ROAD_NAME.into(), vec!["Via Rizzoli"]).into(),
            Series::new(columns::GEOPOINT.into(), vec!["44.49,11.34"]).into(),
        ])
        .unwrap();

        let network =
            FixedNetwork(vec![cand(edge("E7", "Via Rizzoli", "highway.primary"), 2.0)]);
        let (records, summary) = match_road_edges(&df, &network, 25.0, 0).unwrap();
        assert_eq!(summary, MatchSummary { matched: 1, dropped: 0 });
        assert_eq!(records[0].edge_id.as_deref(), Some("E7"));
        assert_eq!(records[0].point.key(), "44.49,11.34");
    }
}
