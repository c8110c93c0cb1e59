//! Assigning sensor points to administrative zones.
//!
//! A point belongs to the first zone whose shape contains it, in dataset
//! order. Points contained by no zone fall back to the zone with the nearest
//! centroid, resolved through an R-tree built once per zone set.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use geo::{Coord, Point};
use polars::{frame::DataFrame, prelude::{NamedFrom, Series}};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::io::csv::{read_csv, str_column, write_csv};
use crate::types::{GeoPoint, columns};

mod parse;

pub use parse::{ZoneShape, parse_geo_shape};

#[derive(Debug, Clone)]
pub struct Zone {
    pub id: String,
    pub shape: ZoneShape,
    pub centroid: Point<f64>,
}

struct ZoneCentroid {
    idx: usize,
    pt: [f64; 2],
}

impl RTreeObject for ZoneCentroid {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pt)
    }
}

impl PointDistance for ZoneCentroid {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pt[0] - point[0];
        let dy = self.pt[1] - point[1];
        dx * dx + dy * dy
    }
}

/// The full zone dataset plus the centroid index. Built once per run and
/// reused for every point query.
pub struct ZoneSet {
    zones: Vec<Zone>,
    rtree: RTree<ZoneCentroid>,
}

impl ZoneSet {
    /// Reads a zone dataset file (`;`-separated, id column + geometry column).
    pub fn load(path: &Path, id_column: &str, shape_column: &str) -> Result<Self> {
        let df = read_csv(path)?;
        Self::from_dataframe(&df, id_column, shape_column)
            .with_context(|| format!("[zones] Failed to load zone set from {}", path.display()))
    }

    /// Builds the zone set. Any malformed geometry aborts the whole load: a
    /// silently missing zone would corrupt the nearest-centroid fallback for
    /// every point.
    pub fn from_dataframe(df: &DataFrame, id_column: &str, shape_column: &str) -> Result<Self> {
        let ids = str_column(df, id_column)?;
        let shapes = str_column(df, shape_column)?;

        let mut zones = Vec::with_capacity(df.height());
        for (id, raw) in ids.into_iter().zip(shapes) {
            let id = id.context("[zones] Zone record without an id")?;
            let raw = raw.with_context(|| format!("[zones] Zone {id} has no geometry"))?;
            let shape = parse_geo_shape(raw)
                .with_context(|| format!("[zones] Zone {id} has a malformed geometry"))?;
            let centroid = shape
                .centroid()
                .with_context(|| format!("[zones] Zone {id} has a degenerate geometry"))?;
            zones.push(Zone { id: id.to_string(), shape, centroid });
        }
        ensure!(!zones.is_empty(), "[zones] Zone dataset is empty");

        let rtree = RTree::bulk_load(
            zones
                .iter()
                .enumerate()
                .map(|(i, z)| ZoneCentroid { idx: i, pt: [z.centroid.x(), z.centroid.y()] })
                .collect(),
        );
        Ok(Self { zones, rtree })
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// First zone containing the point, in dataset order. When zones overlap
    /// the earlier record wins; see DESIGN.md for that decision.
    pub fn containing_zone(&self, coord: Coord<f64>) -> Option<&Zone> {
        self.zones.iter().find(|z| z.shape.contains(coord))
    }

    /// Zone with the nearest centroid; exact ties resolve to the lowest zone
    /// index so repeated runs agree.
    pub fn nearest_zone(&self, coord: Coord<f64>) -> Option<&Zone> {
        let query = [coord.x, coord.y];
        let mut iter = self.rtree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_distance) = iter.next()?;
        let mut best = first.idx;
        for (cand, distance) in iter {
            if distance > best_distance {
                break;
            }
            if cand.idx < best {
                best = cand.idx;
            }
        }
        Some(&self.zones[best])
    }

    /// Containment first, nearest centroid second. `None` only for an empty
    /// set, which construction forbids.
    pub fn assign(&self, coord: Coord<f64>) -> Option<&Zone> {
        self.containing_zone(coord).or_else(|| self.nearest_zone(coord))
    }
}

/// How many points each assignment path handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ZoneReport {
    pub contained: usize,
    pub fallback: usize,
}

/// File contract: update `input` in place, adding `zone_column` with the zone
/// id assigned to each row's geopoint.
pub fn add_zones(
    input: &Path,
    zone_file: &Path,
    zone_column: &str,
    zone_id_column: &str,
    shape_column: &str,
    verbose: u8,
) -> Result<ZoneReport> {
    let mut df = read_csv(input)?;
    let zones = ZoneSet::load(zone_file, zone_id_column, shape_column)?;
    if verbose > 0 {
        eprintln!("[zones] {} zones loaded from {}", zones.len(), zone_file.display());
    }

    let mut report = ZoneReport::default();
    let assigned: Vec<String> = {
        let points = str_column(&df, columns::GEOPOINT)?;
        let mut assigned = Vec::with_capacity(df.height());
        for raw in points {
            let raw = raw.context("[zones] Row without a geopoint")?;
            let coord = GeoPoint::parse(raw)?.zone_coord();
            let zone = match zones.containing_zone(coord) {
                Some(zone) => {
                    report.contained += 1;
                    zone
                }
                None => {
                    report.fallback += 1;
                    zones
                        .nearest_zone(coord)
                        .context("[zones] No nearest zone for point")?
                }
            };
            if verbose > 1 {
                eprintln!("[zones] {raw} -> {}", zone.id);
            }
            assigned.push(zone.id.clone());
        }
        assigned
    };

    df.with_column(Series::new(zone_column.into(), assigned))?;
    write_csv(&mut df, input)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_frame(rows: &[(&str, &str)]) -> DataFrame {
        let ids: Vec<&str> = rows.iter().map(|(id, _)| *id).collect();
        let shapes: Vec<&str> = rows.iter().map(|(_, s)| *s).collect();
        DataFrame::new(vec![
            Series::new(columns::ZONE_ID.into(), ids).into(),
            Series::new(columns::GEO_SHAPE.into(), shapes).into(),
        ])
        .unwrap()
    }

    fn square(x0: f64, y0: f64, size: f64) -> String {
        format!(
            r#"{{"type": "Polygon", "coordinates": [[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}"#,
            x0 = x0,
            y0 = y0,
            x1 = x0 + size,
            y1 = y0 + size,
        )
    }

    #[test]
    fn containment_beats_centroid_distance() {
        // The point sits just inside Z1 but far from Z1's centroid, while Z2's
        // centroid is much closer.
        let df = zone_frame(&[
            ("Z1", &square(0.0, 0.0, 10.0)),
            ("Z2", &square(10.5, 0.0, 1.0)),
        ]);
        let zones = ZoneSet::from_dataframe(&df, columns::ZONE_ID, columns::GEO_SHAPE).unwrap();
        let z = zones.assign(Coord { x: 9.9, y: 0.5 }).unwrap();
        assert_eq!(z.id, "Z1");
    }

    #[test]
    fn outside_points_fall_back_to_nearest_centroid() {
        let df = zone_frame(&[
            ("Z1", &square(0.0, 0.0, 2.0)),
            ("Z2", &square(10.0, 0.0, 2.0)),
        ]);
        let zones = ZoneSet::from_dataframe(&df, columns::ZONE_ID, columns::GEO_SHAPE).unwrap();
        // Contained by neither, closer to Z1's centroid at (1, 1).
        let z = zones.assign(Coord { x: 4.0, y: 1.0 }).unwrap();
        assert_eq!(z.id, "Z1");
        let z = zones.assign(Coord { x: 8.0, y: 1.0 }).unwrap();
        assert_eq!(z.id, "Z2");
    }

    #[test]
    fn centroid_ties_resolve_to_dataset_order() {
        // Centroids at (1, 1) and (5, 1); the query point (3, 1) is equidistant.
        let df = zone_frame(&[
            ("Z2", &square(4.0, 0.0, 2.0)),
            ("Z1", &square(0.0, 0.0, 2.0)),
        ]);
        let zones = ZoneSet::from_dataframe(&df, columns::ZONE_ID, columns::GEO_SHAPE).unwrap();
        let z = zones.assign(Coord { x: 3.0, y: 1.0 }).unwrap();
        assert_eq!(z.id, "Z2");
    }

    #[test]
    fn overlapping_zones_keep_first_in_dataset_order() {
        let df = zone_frame(&[
            ("Z1", &square(0.0, 0.0, 4.0)),
            ("Z2", &square(2.0, 0.0, 4.0)),
        ]);
        let zones = ZoneSet::from_dataframe(&df, columns::ZONE_ID, columns::GEO_SHAPE).unwrap();
        let z = zones.assign(Coord { x: 3.0, y: 1.0 }).unwrap();
        assert_eq!(z.id, "Z1");
    }

    #[test]
    fn malformed_zone_aborts_the_whole_load() {
        let df = zone_frame(&[
            ("Z1", &square(0.0, 0.0, 2.0)),
            ("Z2", r#"{"type": "LineString", "coordinates": [[0,0],[1,1]]}"#),
        ]);
        assert!(ZoneSet::from_dataframe(&df, columns::ZONE_ID, columns::GEO_SHAPE).is_err());
    }

    #[test]
    fn empty_zone_set_is_rejected() {
        let df = zone_frame(&[]);
        assert!(ZoneSet::from_dataframe(&df, columns::ZONE_ID, columns::GEO_SHAPE).is_err());
    }
}
