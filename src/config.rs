/// Tunables for topology inference and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopologyConfig {
    /// A site closer than this to a link endpoint is incident to the link
    /// when adjacency has to be inferred from geometry (meters).
    pub proximity_threshold_m: f64,
    /// Sites in neighbouring hash cells closer than this are reported as
    /// probable duplicates (meters).
    pub close_node_radius_m: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: 2.0,
            close_node_radius_m: 2.0,
        }
    }
}
