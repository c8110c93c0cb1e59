//! Strict parsing of the zone dataset's textual geometry descriptors.
//!
//! The descriptor is a JSON object with `type` and `coordinates` fields. It is
//! deserialized against that schema and nothing else; an unsupported type or a
//! shape that does not fit the declared type is an error, never a coercion.

use anyhow::{Context, Result, bail, ensure};
use geo::{Centroid, Contains, Coord, LineString, Point, Polygon};
use serde::Deserialize;

#[derive(Deserialize)]
struct GeoShapeRepr {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

/// A zone boundary: a polygon's outer ring, or a degenerate point.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneShape {
    Polygon(Polygon<f64>),
    Point(Point<f64>),
}

impl ZoneShape {
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        match self {
            Self::Polygon(polygon) => polygon.contains(&Point::from(coord)),
            Self::Point(point) => *point == Point::from(coord),
        }
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        match self {
            Self::Polygon(polygon) => polygon.centroid(),
            Self::Point(point) => Some(*point),
        }
    }
}

/// Parses one geometry descriptor. The `type` field is case-insensitive;
/// polygon coordinates are rings of (x, y) pairs, of which only the outer ring
/// is kept (holes are not part of the dataset's contract).
pub fn parse_geo_shape(raw: &str) -> Result<ZoneShape> {
    let repr: GeoShapeRepr = serde_json::from_str(raw)
        .with_context(|| format!("[zones::parse] Invalid geo shape descriptor: {raw}"))?;

    match repr.kind.to_lowercase().as_str() {
        "polygon" => {
            let rings: Vec<Vec<(f64, f64)>> = serde_json::from_value(repr.coordinates)
                .with_context(|| format!("[zones::parse] Invalid polygon coordinates: {raw}"))?;
            let Some(outer) = rings.into_iter().next() else {
                bail!("[zones::parse] Polygon with no rings: {raw}");
            };
            ensure!(
                outer.len() >= 3,
                "[zones::parse] Polygon outer ring has fewer than three points: {raw}"
            );
            Ok(ZoneShape::Polygon(Polygon::new(LineString::from(outer), Vec::new())))
        }
        "point" => {
            let (x, y): (f64, f64) = serde_json::from_value(repr.coordinates)
                .with_context(|| format!("[zones::parse] Invalid point coordinates: {raw}"))?;
            Ok(ZoneShape::Point(Point::new(x, y)))
        }
        other => bail!("[zones::parse] Unsupported geometry type {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_polygon_outer_ring() {
        let shape = parse_geo_shape(
            r#"{"type": "Polygon", "coordinates": [[[0.0,0.0],[4.0,0.0],[4.0,4.0],[0.0,4.0],[0.0,0.0]]]}"#,
        )
        .unwrap();
        assert!(shape.contains(Coord { x: 2.0, y: 2.0 }));
        assert!(!shape.contains(Coord { x: 5.0, y: 2.0 }));
    }

    #[test]
    fn type_field_is_case_insensitive() {
        let shape = parse_geo_shape(r#"{"type": "POINT", "coordinates": [11.3, 44.5]}"#).unwrap();
        assert_eq!(shape, ZoneShape::Point(Point::new(11.3, 44.5)));
    }

    #[test]
    fn degenerate_point_contains_only_itself() {
        let shape = parse_geo_shape(r#"{"type": "point", "coordinates": [1.0, 2.0]}"#).unwrap();
        assert!(shape.contains(Coord { x: 1.0, y: 2.0 }));
        assert!(!shape.contains(Coord { x: 1.0, y: 2.1 }));
    }

    #[test]
    fn rejects_unsupported_geometry_type() {
        let err = parse_geo_shape(r#"{"type": "MultiPolygon", "coordinates": []}"#).unwrap_err();
        assert!(err.to_string().contains("Unsupported geometry type"));
    }

    #[test]
    fn rejects_malformed_descriptor() {
        assert!(parse_geo_shape("Polygon((0 0, 1 1))").is_err());
        assert!(parse_geo_shape(r#"{"coordinates": []}"#).is_err());
        assert!(
            parse_geo_shape(r#"{"type": "polygon", "coordinates": [[[0.0,0.0],[1.0,1.0]]]}"#)
                .is_err()
        );
    }
}
