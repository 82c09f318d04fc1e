//! Branch spawning from drag-to-empty-space gestures.

use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, Result};
use crate::graph::{
    Edge, GraphStore, IdGenerator, InputData, Node, NodeId, NodeKind, Position, SourceHandle,
    TargetHandle,
};

/// Pan/zoom of the rendered canvas, used to map pointer coordinates into
/// flow coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_flow(&self, screen: Position) -> Position {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        Position::new((screen.x - self.x) / zoom, (screen.y - self.y) / zoom)
    }
}

/// End of a connection drag as reported by the renderer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConnectEnd {
    pub from_node: NodeId,
    /// `None` when the renderer did not report which handle was dragged.
    pub from_handle: Option<SourceHandle>,
    /// True when the drag landed on an existing handle.
    pub is_valid: bool,
    pub screen_position: Position,
}

/// Create a pinned anchor input at `at`, wired from `source_id`'s `handle`.
///
/// Only message nodes can originate a branch, and only from a handle their
/// role exposes. Nothing is mutated on rejection.
pub fn spawn_branch(
    graph: &mut GraphStore,
    ids: &mut IdGenerator,
    source_id: &str,
    handle: SourceHandle,
    at: Position,
) -> Result<NodeId> {
    let source = graph
        .node(source_id)
        .ok_or_else(|| CanvasError::NodeNotFound(source_id.to_string()))?;

    let role = match &source.kind {
        NodeKind::Message(data) => data.role,
        NodeKind::Input(_) => {
            return Err(CanvasError::InvalidBranchSource {
                node_id: source_id.to_string(),
                handle: handle.id().to_string(),
            })
        }
    };
    if !handle.is_exposed_by(role) {
        return Err(CanvasError::InvalidBranchSource {
            node_id: source_id.to_string(),
            handle: handle.id().to_string(),
        });
    }

    let input_id = ids.next_node_id("input");
    let edge_id = ids.next_edge_id();

    graph.add_nodes([Node::input(input_id.clone(), at, InputData::new(true, true))]);
    graph.add_edges([Edge::new(
        edge_id,
        source_id,
        handle,
        input_id.clone(),
        TargetHandle::Top,
    )]);

    tracing::info!(
        source = %source_id,
        handle = %handle,
        input_id = %input_id,
        x = at.x,
        y = at.y,
        "Branch: spawned anchor input"
    );

    Ok(input_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MessageData, Role};

    fn graph_with(role: Role) -> GraphStore {
        GraphStore::from_parts(
            vec![
                Node::message(
                    "m",
                    Position::default(),
                    MessageData {
                        role,
                        content: "hi".to_string(),
                        is_loading: false,
                        pinned: false,
                        is_anchor: false,
                    },
                ),
                Node::input("i", Position::default(), InputData::new(false, false)),
            ],
            vec![Edge::trunk("e1", "m", "i")],
        )
    }

    #[test]
    fn spawns_pinned_anchor_at_drop_point() {
        let mut graph = graph_with(Role::Assistant);
        let mut ids = IdGenerator::new();

        let id = spawn_branch(
            &mut graph,
            &mut ids,
            "m",
            SourceHandle::Right,
            Position::new(400.0, 400.0),
        )
        .unwrap();

        let node = graph.node(&id).unwrap();
        assert_eq!(node.position, Position::new(400.0, 400.0));
        assert!(node.is_anchor());
        assert!(node.is_pinned());
        let edge = graph.parent_edge(&id).unwrap();
        assert_eq!(edge.source, "m");
        assert_eq!(edge.source_handle, SourceHandle::Right);
        assert_eq!(edge.target_handle, TargetHandle::Top);
    }

    #[test]
    fn input_nodes_cannot_branch() {
        let mut graph = graph_with(Role::Assistant);
        let before = graph.clone();
        let mut ids = IdGenerator::new();

        let err = spawn_branch(&mut graph, &mut ids, "i", SourceHandle::Bottom, Position::default())
            .unwrap_err();
        assert!(matches!(err, CanvasError::InvalidBranchSource { .. }));
        assert_eq!(graph, before);
    }

    #[test]
    fn user_messages_reject_side_handles() {
        let mut graph = graph_with(Role::User);
        let mut ids = IdGenerator::new();

        assert!(spawn_branch(&mut graph, &mut ids, "m", SourceHandle::Left, Position::default()).is_err());
        assert!(spawn_branch(&mut graph, &mut ids, "m", SourceHandle::Bottom, Position::default()).is_ok());
    }

    #[test]
    fn viewport_translates_screen_points() {
        let viewport = Viewport {
            x: 100.0,
            y: 50.0,
            zoom: 2.0,
        };
        assert_eq!(
            viewport.screen_to_flow(Position::new(500.0, 450.0)),
            Position::new(200.0, 200.0)
        );
        assert_eq!(
            Viewport::default().screen_to_flow(Position::new(400.0, 400.0)),
            Position::new(400.0, 400.0)
        );
    }
}
