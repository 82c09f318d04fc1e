use super::edge::EdgeId;
use super::node::NodeId;

/// Session-owned id source. Node and edge ids come from two independent
/// monotonically increasing counters and are never reused until `reset`.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    node_counter: u64,
    edge_counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a node id such as `input-3` or `assistant-7`.
    pub fn next_node_id(&mut self, prefix: &str) -> NodeId {
        self.node_counter += 1;
        format!("{}-{}", prefix, self.node_counter)
    }

    pub fn next_edge_id(&mut self) -> EdgeId {
        self.edge_counter += 1;
        format!("edge-{}", self.edge_counter)
    }

    pub fn reset(&mut self) {
        self.node_counter = 0;
        self.edge_counter = 0;
    }
}
