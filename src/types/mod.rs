use anyhow::{Context, Result, anyhow};
use geo::Coord;

/// Column names of the Bologna open-data traffic-loop export. The raw files keep
/// their Italian headers; renamed English columns only appear in derived exports.
pub mod columns {
    pub const ROAD_NAME: &str = "Nome via";
    pub const GEOPOINT: &str = "geopoint";
    pub const EDGE_ID: &str = "edge_id";
    pub const DATE: &str = "data";
    pub const SENSOR_ID: &str = "ID_univoco_stazione_spira";
    pub const SENSOR_CODE: &str = "codice_spira";
    pub const DIRECTION: &str = "direzione";
    pub const LONGITUDE: &str = "longitudine";
    pub const LATITUDE: &str = "latitudine";
    pub const LEVEL: &str = "Livello";
    pub const NODE_FROM: &str = "Nodo da";
    pub const NODE_TO: &str = "Nodo a";
    pub const GEO_SHAPE: &str = "Geo Shape";
    pub const ZONE_ID: &str = "Codice Area Statistica";
}

/// A sensor coordinate parsed from the `geopoint` column.
///
/// The raw `"lat,lon"` string is retained: join keys compare the original text,
/// never coordinates with a tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    raw: String,
}

impl GeoPoint {
    pub fn parse(raw: &str) -> Result<Self> {
        let (lat, lon) = raw
            .split_once(',')
            .ok_or_else(|| anyhow!("[types] geopoint {raw:?} is not a \"lat,lon\" pair"))?;
        let lat = lat
            .trim()
            .parse()
            .with_context(|| format!("[types] Invalid latitude in geopoint {raw:?}"))?;
        let lon = lon
            .trim()
            .parse()
            .with_context(|| format!("[types] Invalid longitude in geopoint {raw:?}"))?;
        Ok(Self { lat, lon, raw: raw.to_string() })
    }

    /// The raw source string, used as the exact-match join key.
    pub fn key(&self) -> &str {
        &self.raw
    }

    /// Coordinate in the zone dataset's convention. Geopoints are stored
    /// `"lat,lon"` while zone geometries are (lon, lat), so the components swap.
    pub fn zone_coord(&self) -> Coord<f64> {
        Coord { x: self.lon, y: self.lat }
    }
}

/// One row of the road-names table: a distinct (road name, geopoint) pair and
/// the network edge it resolved to, if matching (or backfill) succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadNameRecord {
    pub road_name: String,
    pub point: GeoPoint,
    pub edge_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pair() {
        let p = GeoPoint::parse("44.4992, 11.3271").unwrap();
        assert_eq!(p.lat, 44.4992);
        assert_eq!(p.lon, 11.3271);
        assert_eq!(p.key(), "44.4992, 11.3271");
    }

    #[test]
    fn zone_coord_swaps_components() {
        let p = GeoPoint::parse("44.5,11.3").unwrap();
        let c = p.zone_coord();
        assert_eq!((c.x, c.y), (11.3, 44.5));
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(GeoPoint::parse("44.5 11.3").is_err());
    }

    #[test]
    fn rejects_non_numeric_components() {
        assert!(GeoPoint::parse("44.5,north").is_err());
    }
}
