//! The road-network seam.
//!
//! The matching core only ever talks to [`RoadNetwork`]; the network itself
//! (edge geometry, projection, spatial index) sits behind the trait. The one
//! shipped implementation reads a SUMO `.net.xml`.

use ahash::AHashMap;
use anyhow::Result;

mod sumo;

pub use sumo::SumoNetwork;

/// Default search radius for edge matching, in network-local units (meters).
pub const DEFAULT_MATCH_RADIUS: f64 = 25.0;

/// Edge types a vehicle sensor must never snap onto.
pub const NON_DRIVABLE_EDGE_TYPES: [&str; 6] = [
    "highway.pedestrian",
    "highway.track",
    "highway.footway",
    "highway.path",
    "highway.cycleway",
    "highway.steps",
];

/// A network edge as reported by a proximity query. Read-only: the core never
/// constructs edges, it only selects among the ones the network returns.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkEdge {
    pub id: String,
    /// Display name, possibly empty for unnamed segments.
    pub name: String,
    pub edge_type: String,
}

impl NetworkEdge {
    pub fn is_drivable(&self) -> bool {
        !NON_DRIVABLE_EDGE_TYPES.contains(&self.edge_type.as_str())
    }
}

/// An edge together with its distance to the queried point.
#[derive(Debug, Clone)]
pub struct EdgeCandidate {
    pub edge: NetworkEdge,
    pub distance: f64,
}

/// Read-only queries against a road network graph.
pub trait RoadNetwork {
    /// Edges within `radius` of the network-local point `(x, y)`, unordered.
    fn nearest_edges(&self, x: f64, y: f64, radius: f64) -> Vec<EdgeCandidate>;

    /// Length of every edge, keyed by edge id.
    fn edge_lengths(&self) -> AHashMap<String, f64>;

    /// Convert geographic (lon, lat) to network-local (x, y).
    fn convert_lon_lat(&self, lon: f64, lat: f64) -> Result<(f64, f64)>;
}
