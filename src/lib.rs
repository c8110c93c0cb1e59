#![doc = "Preprocessing of urban traffic-loop datasets into Eclipse SUMO inputs"]
mod edges;
mod io;
mod network;
pub mod pipeline;
mod types;
mod zones;

#[doc(inline)]
pub use types::{GeoPoint, RoadNameRecord, columns};

#[doc(inline)]
pub use network::{
    DEFAULT_MATCH_RADIUS, EdgeCandidate, NON_DRIVABLE_EDGE_TYPES, NetworkEdge, RoadNetwork,
    SumoNetwork,
};

#[doc(inline)]
pub use edges::{
    MatchSummary, backfill_edge_ids, backfill_file, generate_road_names, link_edge_ids, link_file,
    match_road_edges, read_road_names, write_road_names,
};

#[doc(inline)]
pub use zones::{Zone, ZoneReport, ZoneSet, ZoneShape, add_zones};
