//! A [`RoadNetwork`] backed by a SUMO `.net.xml` file.
//!
//! Only what the proximity queries need is parsed: the `<location>` element
//! (projection string and network offset) and the non-internal `<edge>`
//! elements with their geometry. Edge shapes fall back to the first lane's
//! shape when the edge itself carries none, matching how SUMO nets are written.

use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result, bail, ensure};
use geo::{BoundingRect, Distance, Euclidean, LineString, Point, Rect};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rstar::{AABB, RTree, RTreeObject};

use super::{EdgeCandidate, NetworkEdge, RoadNetwork};

struct SumoEdge {
    edge: NetworkEdge,
    shape: LineString<f64>,
    length: f64,
}

#[derive(Clone)]
struct EdgeEnvelope {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for EdgeEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

pub struct SumoNetwork {
    edges: Vec<SumoEdge>,
    rtree: RTree<EdgeEnvelope>,
    net_offset: (f64, f64),
    projection: proj4rs::Proj,
    geographic: proj4rs::Proj,
}

impl SumoNetwork {
    /// Parses a `.net.xml` and builds the spatial index over edge geometries.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = Reader::from_file(path)
            .with_context(|| format!("[network::sumo] Failed to open {}", path.display()))?;
        reader.config_mut().trim_text(true);

        let mut net_offset = None;
        let mut proj_parameter = None;
        let mut edges: Vec<SumoEdge> = Vec::new();
        // Attributes of the <edge> currently being read, if it is a normal edge.
        let mut current: Option<(String, String, String, Option<LineString<f64>>, Option<f64>)> =
            None;

        let mut buf = Vec::new();
        loop {
            let event = reader
                .read_event_into(&mut buf)
                .with_context(|| format!("[network::sumo] XML error in {}", path.display()))?;
            // Self-closing <edge/> elements never produce an End event.
            let self_closing = matches!(&event, Event::Empty(e) if e.name().as_ref() == b"edge");
            match event {
                Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                    b"location" => {
                        net_offset = Some(parse_offset(attr(&e, b"netOffset")?.as_deref())?);
                        proj_parameter = attr(&e, b"projParameter")?;
                    }
                    b"edge" => {
                        // Internal (junction) edges carry no usable road identity.
                        if attr(&e, b"function")?.as_deref() == Some("internal") {
                            current = None;
                        } else {
                            let id = attr(&e, b"id")?
                                .context("[network::sumo] <edge> element without an id")?;
                            let name = attr(&e, b"name")?.unwrap_or_default();
                            let edge_type = attr(&e, b"type")?.unwrap_or_default();
                            let shape = match attr(&e, b"shape")? {
                                Some(s) => Some(parse_shape(&s)?),
                                None => None,
                            };
                            current = Some((id, name, edge_type, shape, None));
                        }
                    }
                    b"lane" => {
                        if let Some((_, _, _, shape, length)) = current.as_mut() {
                            if shape.is_none() {
                                if let Some(s) = attr(&e, b"shape")? {
                                    *shape = Some(parse_shape(&s)?);
                                }
                            }
                            if length.is_none() {
                                if let Some(l) = attr(&e, b"length")? {
                                    *length = Some(l.parse().with_context(|| {
                                        format!("[network::sumo] Invalid lane length {l:?}")
                                    })?);
                                }
                            }
                        }
                    }
                    _ => {}
                },
                Event::End(e) if e.name().as_ref() == b"edge" => {
                    finish_edge(&mut current, &mut edges)?;
                }
                Event::Eof => break,
                _ => {}
            }
            if self_closing {
                finish_edge(&mut current, &mut edges)?;
            }
            buf.clear();
        }

        let net_offset =
            net_offset.context("[network::sumo] Network has no <location> element")?;
        let proj_parameter =
            proj_parameter.context("[network::sumo] Network has no projParameter")?;
        if !proj_parameter.starts_with('+') {
            bail!(
                "[network::sumo] Network has no geographic projection \
                 (projParameter {proj_parameter:?}); re-export the net with projection data"
            );
        }
        let projection = proj4rs::Proj::from_proj_string(&proj_parameter).with_context(|| {
            format!("[network::sumo] Unsupported projection {proj_parameter:?}")
        })?;
        let geographic = proj4rs::Proj::from_proj_string("+proj=longlat +datum=WGS84 +no_defs")
            .context("[network::sumo] Failed to construct the WGS84 source projection")?;

        ensure!(!edges.is_empty(), "[network::sumo] Network contains no edges");
        let mut envelopes = Vec::with_capacity(edges.len());
        for (i, e) in edges.iter().enumerate() {
            let bbox = e.shape.bounding_rect().with_context(|| {
                format!("[network::sumo] Edge {} has an empty shape", e.edge.id)
            })?;
            envelopes.push(EdgeEnvelope { idx: i, bbox });
        }
        let rtree = RTree::bulk_load(envelopes);

        Ok(Self { edges, rtree, net_offset, projection, geographic })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl RoadNetwork for SumoNetwork {
    fn nearest_edges(&self, x: f64, y: f64, radius: f64) -> Vec<EdgeCandidate> {
        let search =
            AABB::from_corners([x - radius, y - radius], [x + radius, y + radius]);
        let pt = Point::new(x, y);

        let mut found = Vec::new();
        for cand in self.rtree.locate_in_envelope_intersecting(&search) {
            let edge = &self.edges[cand.idx];
            let distance = Euclidean.distance(&pt, &edge.shape);
            if distance <= radius {
                found.push(EdgeCandidate { edge: edge.edge.clone(), distance });
            }
        }
        found
    }

    fn edge_lengths(&self) -> AHashMap<String, f64> {
        self.edges.iter().map(|e| (e.edge.id.clone(), e.length)).collect()
    }

    fn convert_lon_lat(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        proj4rs::transform::transform(&self.geographic, &self.projection, &mut point)
            .with_context(|| format!("[network::sumo] Failed to project ({lon}, {lat})"))?;
        Ok((point.0 + self.net_offset.0, point.1 + self.net_offset.1))
    }
}

fn finish_edge(
    current: &mut Option<(String, String, String, Option<LineString<f64>>, Option<f64>)>,
    edges: &mut Vec<SumoEdge>,
) -> Result<()> {
    if let Some((id, name, edge_type, shape, length)) = current.take() {
        let shape = shape.with_context(|| {
            format!("[network::sumo] Edge {id} has no shape on edge or lanes")
        })?;
        let length = length.unwrap_or_else(|| polyline_length(&shape));
        edges.push(SumoEdge { edge: NetworkEdge { id, name, edge_type }, shape, length });
    }
    Ok(())
}

fn attr(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for a in e.attributes() {
        let a = a.context("[network::sumo] Malformed XML attribute")?;
        if a.key.as_ref() == key {
            let value = a
                .unescape_value()
                .context("[network::sumo] Malformed XML attribute value")?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Parses a SUMO shape attribute: space-separated `x,y` pairs.
fn parse_shape(raw: &str) -> Result<LineString<f64>> {
    let mut coords = Vec::new();
    for pair in raw.split_whitespace() {
        let (x, y) = pair
            .split_once(',')
            .with_context(|| format!("[network::sumo] Malformed shape point {pair:?}"))?;
        coords.push(geo::Coord {
            x: x.parse::<f64>()
                .with_context(|| format!("[network::sumo] Malformed shape point {pair:?}"))?,
            y: y.parse::<f64>()
                .with_context(|| format!("[network::sumo] Malformed shape point {pair:?}"))?,
        });
    }
    ensure!(coords.len() >= 2, "[network::sumo] Shape {raw:?} has fewer than two points");
    Ok(LineString::new(coords))
}

fn parse_offset(raw: Option<&str>) -> Result<(f64, f64)> {
    let raw = raw.context("[network::sumo] <location> element without netOffset")?;
    let (x, y) = raw
        .split_once(',')
        .with_context(|| format!("[network::sumo] Malformed netOffset {raw:?}"))?;
    Ok((
        x.parse().with_context(|| format!("[network::sumo] Malformed netOffset {raw:?}"))?,
        y.parse().with_context(|| format!("[network::sumo] Malformed netOffset {raw:?}"))?,
    ))
}

fn polyline_length(shape: &LineString<f64>) -> f64 {
    shape
        .lines()
        .map(|l| Euclidean.distance(&Point::from(l.start), &Point::from(l.end)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shape_pairs() {
        let shape = parse_shape("0.0,0.0 10.0,0.0 10.0,5.0").unwrap();
        assert_eq!(shape.0.len(), 3);
        assert_eq!(polyline_length(&shape), 15.0);
    }

    #[test]
    fn rejects_degenerate_shape() {
        assert!(parse_shape("1.0,2.0").is_err());
        assert!(parse_shape("1.0;2.0 3.0;4.0").is_err());
    }

    #[test]
    fn parses_net_offset() {
        assert_eq!(parse_offset(Some("-686337.80,-4929771.35")).unwrap().0, -686337.80);
        assert!(parse_offset(None).is_err());
    }
}
