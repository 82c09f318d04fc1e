use crate::graph::{
    Edge, GraphStore, IdGenerator, InputData, MessageData, Node, Position, Role,
};

pub const WELCOME_NODE_ID: &str = "welcome";
pub const WELCOME_MESSAGE: &str = "Hello! How can I help you today?";

/// Seed a fresh canvas: the welcome message with one input below it.
pub fn seed_graph(ids: &mut IdGenerator) -> GraphStore {
    let input_id = ids.next_node_id("input");

    let welcome = Node::message(
        WELCOME_NODE_ID,
        Position::new(250.0, 50.0),
        MessageData {
            role: Role::Assistant,
            content: WELCOME_MESSAGE.to_string(),
            is_loading: false,
            pinned: false,
            is_anchor: false,
        },
    );
    let input = Node::input(
        input_id.clone(),
        Position::new(250.0, 250.0),
        InputData::new(false, false),
    );

    GraphStore::from_parts(
        vec![welcome, input],
        vec![Edge::trunk(ids.next_edge_id(), WELCOME_NODE_ID, input_id)],
    )
}
