//! Node - the two kinds of boxes that live on the canvas
//!
//! A node is either a message (user or assistant turn) or an input box that
//! is waiting for the user to type. Both share an id, a position in flow
//! coordinates and an optional measured size that is only known once the
//! renderer has painted the node.

use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Placeholder shown by freshly created input nodes.
pub const INPUT_PLACEHOLDER: &str = "Type your message...";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub role: Role,
    /// Empty while the assistant is still generating.
    pub content: String,
    pub is_loading: bool,
    /// Part of a detached branch rather than the default trunk.
    #[serde(default)]
    pub pinned: bool,
    /// First node of a dragged-out branch; never moved by the layout engine.
    #[serde(default)]
    pub is_anchor: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    pub draft: String,
    pub placeholder: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub is_anchor: bool,
}

impl InputData {
    pub fn new(pinned: bool, is_anchor: bool) -> Self {
        Self {
            draft: String::new(),
            placeholder: INPUT_PLACEHOLDER.to_string(),
            pinned,
            is_anchor,
        }
    }
}

/// Closed set of node variants. Every consumer matches exhaustively.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum NodeKind {
    #[serde(rename = "messageNode")]
    Message(MessageData),
    #[serde(rename = "userInputNode")]
    Input(InputData),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    /// Unknown until the first paint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Size>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn message(id: impl Into<NodeId>, position: Position, data: MessageData) -> Self {
        Self {
            id: id.into(),
            position,
            measured: None,
            kind: NodeKind::Message(data),
        }
    }

    pub fn input(id: impl Into<NodeId>, position: Position, data: InputData) -> Self {
        Self {
            id: id.into(),
            position,
            measured: None,
            kind: NodeKind::Input(data),
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, NodeKind::Message(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, NodeKind::Input(_))
    }

    pub fn as_message(&self) -> Option<&MessageData> {
        match &self.kind {
            NodeKind::Message(data) => Some(data),
            NodeKind::Input(_) => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut MessageData> {
        match &mut self.kind {
            NodeKind::Message(data) => Some(data),
            NodeKind::Input(_) => None,
        }
    }

    pub fn as_input(&self) -> Option<&InputData> {
        match &self.kind {
            NodeKind::Input(data) => Some(data),
            NodeKind::Message(_) => None,
        }
    }

    pub fn as_input_mut(&mut self) -> Option<&mut InputData> {
        match &mut self.kind {
            NodeKind::Input(data) => Some(data),
            NodeKind::Message(_) => None,
        }
    }

    pub fn is_anchor(&self) -> bool {
        match &self.kind {
            NodeKind::Message(data) => data.is_anchor,
            NodeKind::Input(data) => data.is_anchor,
        }
    }

    pub fn is_pinned(&self) -> bool {
        match &self.kind {
            NodeKind::Message(data) => data.pinned,
            NodeKind::Input(data) => data.pinned,
        }
    }

    /// Measured width, if the renderer has reported a non-zero one.
    pub fn known_width(&self) -> Option<f64> {
        self.measured.map(|s| s.width).filter(|w| *w > 0.0)
    }

    /// Measured height, if the renderer has reported a non-zero one.
    pub fn known_height(&self) -> Option<f64> {
        self.measured.map(|s| s.height).filter(|h| *h > 0.0)
    }
}
