pub mod detectors;
pub mod edges;
pub mod filters;
pub mod flow;
pub mod zones;
