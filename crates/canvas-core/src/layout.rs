//! Layout engine - parent-centered stacking, one hop at a time
//!
//! When a node reports a new size it is re-centered under its parent and its
//! direct children are re-stacked under it. Grandchildren are left alone:
//! moving a child does not trigger another pass, so a deep chain below a
//! resized ancestor can stay stale until its own nodes are measured again.

use crate::graph::{GraphStore, Node, NodeId, Position};

/// Vertical space between a parent's bottom edge and its child.
pub const NODE_GAP: f64 = 30.0;

/// Height assumed for nodes that have not been measured yet.
pub const DEFAULT_NODE_HEIGHT: f64 = 120.0;

/// Moves at or below this distance are ignored to avoid re-render churn.
pub const LAYOUT_EPSILON: f64 = 1.0;

pub fn node_bottom(node: &Node) -> f64 {
    node.position.y + node.known_height().unwrap_or(DEFAULT_NODE_HEIGHT)
}

/// Y coordinate for a node stacked directly under `parent`.
pub fn stacked_y(parent: &Node) -> f64 {
    node_bottom(parent) + NODE_GAP
}

fn centered_x(parent: &Node, parent_width: f64, child_width: f64) -> f64 {
    parent.position.x + parent_width / 2.0 - child_width / 2.0
}

fn exceeds_epsilon(current: Position, target: Position) -> bool {
    (current.x - target.x).abs() > LAYOUT_EPSILON || (current.y - target.y).abs() > LAYOUT_EPSILON
}

fn move_if_needed(graph: &mut GraphStore, id: &str, target: Position, moved: &mut Vec<NodeId>) {
    let Some(current) = graph.node(id).map(|n| n.position) else {
        return;
    };
    if exceeds_epsilon(current, target) {
        graph.reposition_node(id, target);
        moved.push(id.to_string());
    }
}

/// Re-position `node_id` relative to its parent and its direct children
/// relative to it. Returns the ids of the nodes that moved.
pub fn relax_around(graph: &mut GraphStore, node_id: &str) -> Vec<NodeId> {
    let mut moved = Vec::new();

    let Some(node) = graph.node(node_id) else {
        return moved;
    };

    if !node.is_anchor() {
        if let Some(parent) = graph.parent(node_id) {
            if let (Some(parent_width), Some(width)) = (parent.known_width(), node.known_width()) {
                let target = Position::new(
                    centered_x(parent, parent_width, width),
                    stacked_y(parent),
                );
                move_if_needed(graph, node_id, target, &mut moved);
            }
        }
    }

    let Some(node) = graph.node(node_id).cloned() else {
        return moved;
    };
    let child_y = stacked_y(&node);

    for child_id in graph.children_ids(node_id) {
        let Some(child) = graph.node(&child_id) else {
            continue;
        };
        if child.is_anchor() {
            continue;
        }

        let x = match (node.known_width(), child.known_width()) {
            (Some(parent_width), Some(width)) => centered_x(&node, parent_width, width),
            _ => child.position.x,
        };
        move_if_needed(graph, &child_id, Position::new(x, child_y), &mut moved);
    }

    if !moved.is_empty() {
        tracing::debug!(node_id = %node_id, moved = ?moved, "Layout: relaxed around resized node");
    }

    moved
}
