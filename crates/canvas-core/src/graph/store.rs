//! GraphStore - the set of nodes and edges currently on the canvas
//!
//! All operations are plain transformations of the `(nodes, edges)` pair.
//! Inputs are assumed structurally valid: an operation that references a
//! missing node is a no-op for that node.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::edge::{Edge, TargetHandle};
use super::node::{Node, NodeId, Position};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Nodes in insertion (paint) order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) {
        self.nodes.extend(nodes);
    }

    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>) {
        self.edges.extend(edges);
    }

    /// Remove exactly the given nodes together with every edge that touches
    /// them. Returns the nodes that were actually removed.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Vec<Node> {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let (removed, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| doomed.contains(n.id.as_str()));
        self.nodes = kept;

        self.edges
            .retain(|e| !doomed.contains(e.source.as_str()) && !doomed.contains(e.target.as_str()));

        removed
    }

    /// Apply `patch` to the node with `id`. Returns false if it does not exist.
    pub fn update_node(&mut self, id: &str, patch: impl FnOnce(&mut Node)) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                patch(node);
                true
            }
            None => false,
        }
    }

    pub fn reposition_node(&mut self, id: &str, position: Position) -> bool {
        self.update_node(id, |node| node.position = position)
    }

    /// The unique incoming edge of `id`, if any.
    pub fn parent_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.target == id)
    }

    pub fn parent(&self, id: &str) -> Option<&Node> {
        self.parent_edge(id).and_then(|e| self.node(&e.source))
    }

    pub fn child_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    pub fn children_ids(&self, id: &str) -> Vec<NodeId> {
        self.child_edges(id).map(|e| e.target.clone()).collect()
    }

    /// Point every edge that currently targets `old_target` at `new_target`
    /// instead. Returns the number of edges rewritten.
    pub fn retarget_incoming(
        &mut self,
        old_target: &str,
        new_target: &str,
        handle: TargetHandle,
    ) -> usize {
        let mut rewritten = 0;
        for edge in self.edges.iter_mut().filter(|e| e.target == old_target) {
            edge.target = new_target.to_string();
            edge.target_handle = handle;
            rewritten += 1;
        }
        rewritten
    }

    /// Transitive descendants of the seeds, breadth first, excluding the
    /// seeds themselves. An id already queued is never queued again.
    pub fn descendants(&self, seeds: &[NodeId]) -> Vec<NodeId> {
        let mut visited: HashSet<NodeId> = seeds.iter().cloned().collect();
        let mut queue: VecDeque<NodeId> = seeds.iter().cloned().collect();
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for edge in self.child_edges(&current) {
                if visited.insert(edge.target.clone()) {
                    found.push(edge.target.clone());
                    queue.push_back(edge.target.clone());
                }
            }
        }

        found
    }

    /// Remove the seeds, all of their descendants and every edge touching
    /// any of them. Returns the ids of the nodes that were removed.
    pub fn cascade_delete(&mut self, seeds: &[NodeId]) -> Vec<NodeId> {
        let mut doomed: Vec<NodeId> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if !doomed.contains(seed) {
                doomed.push(seed.clone());
            }
        }
        doomed.extend(self.descendants(seeds));

        self.remove_nodes(&doomed)
            .into_iter()
            .map(|node| node.id)
            .collect()
    }

    /// Nodes without outgoing edges.
    pub fn leaves(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| self.child_edges(&n.id).next().is_none())
            .collect()
    }

    /// Nodes without an incoming edge.
    pub fn roots(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| self.parent_edge(&n.id).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{InputData, MessageData, Role};

    fn message(id: &str, role: Role) -> Node {
        Node::message(
            id,
            Position::default(),
            MessageData {
                role,
                content: id.to_string(),
                is_loading: false,
                pinned: false,
                is_anchor: false,
            },
        )
    }

    fn input(id: &str) -> Node {
        Node::input(id, Position::default(), InputData::new(false, false))
    }

    /// welcome -> u1 -> a1 -> input-x
    ///                     \-> u2 -> a2
    fn sample() -> GraphStore {
        GraphStore::from_parts(
            vec![
                message("welcome", Role::Assistant),
                message("u1", Role::User),
                message("a1", Role::Assistant),
                input("input-x"),
                message("u2", Role::User),
                message("a2", Role::Assistant),
            ],
            vec![
                Edge::trunk("e1", "welcome", "u1"),
                Edge::trunk("e2", "u1", "a1"),
                Edge::trunk("e3", "a1", "input-x"),
                Edge::trunk("e4", "a1", "u2"),
                Edge::trunk("e5", "u2", "a2"),
            ],
        )
    }

    #[test]
    fn descendants_are_breadth_first() {
        let graph = sample();
        assert_eq!(
            graph.descendants(&["u1".to_string()]),
            vec!["a1", "input-x", "u2", "a2"]
        );
        assert!(graph.descendants(&["a2".to_string()]).is_empty());
    }

    #[test]
    fn cascade_delete_leaves_no_dangling_edges() {
        let mut graph = sample();
        let removed = graph.cascade_delete(&["a1".to_string()]);

        assert_eq!(removed.len(), 4);
        assert_eq!(graph.nodes().len(), 2);
        for edge in graph.edges() {
            assert!(graph.contains(&edge.source), "dangling source {}", edge.id);
            assert!(graph.contains(&edge.target), "dangling target {}", edge.id);
        }
    }

    #[test]
    fn cascade_delete_is_idempotent() {
        let mut graph = sample();
        graph.cascade_delete(&["u2".to_string()]);
        let snapshot = graph.clone();

        let removed = graph.cascade_delete(&["u2".to_string()]);
        assert!(removed.is_empty());
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn cascade_delete_tolerates_a_cycle() {
        let mut graph = sample();
        graph.add_edges([Edge::trunk("loop", "a2", "u1")]);

        let removed = graph.cascade_delete(&["u1".to_string()]);
        assert_eq!(removed.len(), 5);
        assert_eq!(graph.nodes().len(), 1);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn retarget_moves_the_incoming_edge() {
        let mut graph = sample();
        graph.add_nodes([message("u3", Role::User)]);

        assert_eq!(graph.retarget_incoming("input-x", "u3", TargetHandle::Top), 1);
        assert_eq!(graph.parent_edge("u3").map(|e| e.source.as_str()), Some("a1"));
        assert!(graph.parent_edge("input-x").is_none());
    }

    #[test]
    fn missing_nodes_are_no_ops() {
        let mut graph = sample();
        assert!(!graph.reposition_node("nope", Position::new(1.0, 1.0)));
        assert!(graph.remove_nodes(&["nope".to_string()]).is_empty());
        assert_eq!(graph.nodes().len(), 6);
    }

    #[test]
    fn leaves_and_roots() {
        let graph = sample();
        let leaves: Vec<&str> = graph.leaves().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(leaves, vec!["input-x", "a2"]);
        let roots: Vec<&str> = graph.roots().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, vec!["welcome"]);
    }
}
