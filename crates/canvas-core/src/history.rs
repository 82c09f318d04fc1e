//! History reconstruction - the linear transcript behind any node
//!
//! Walking parent edges from a node back to its root yields exactly the
//! messages the model should see for that branch; sibling branches never
//! leak in because every node has at most one parent.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphStore, NodeKind, Role};

/// One turn of the transcript sent to the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Root-to-`start` sequence of message turns on the ancestor chain of
/// `start` (inclusive). Input nodes on the path contribute nothing.
pub fn reconstruct(graph: &GraphStore, start: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(start.to_string());

    while let Some(id) = current.take() {
        if !visited.insert(id.clone()) {
            tracing::warn!(node_id = %id, "History walk revisited a node; stopping");
            break;
        }

        if let Some(node) = graph.node(&id) {
            match &node.kind {
                NodeKind::Message(data) => messages.push(ChatMessage {
                    role: data.role,
                    content: data.content.clone(),
                }),
                NodeKind::Input(_) => {}
            }
        }

        current = graph.parent_edge(&id).map(|edge| edge.source.clone());
    }

    messages.reverse();
    messages
}
