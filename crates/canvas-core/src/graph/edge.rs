use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::node::{NodeId, Role};
use crate::error::CanvasError;

pub type EdgeId = String;

/// Side of the source node an edge departs from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SourceHandle {
    #[default]
    #[serde(rename = "bottom-source")]
    Bottom,
    #[serde(rename = "left-source")]
    Left,
    #[serde(rename = "right-source")]
    Right,
}

impl SourceHandle {
    pub fn id(&self) -> &'static str {
        match self {
            SourceHandle::Bottom => "bottom-source",
            SourceHandle::Left => "left-source",
            SourceHandle::Right => "right-source",
        }
    }

    /// Assistant messages expose all three source handles, user messages
    /// only the bottom one.
    pub fn is_exposed_by(&self, role: Role) -> bool {
        match role {
            Role::Assistant => true,
            Role::User => *self == SourceHandle::Bottom,
        }
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SourceHandle {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom" | "bottom-source" => Ok(SourceHandle::Bottom),
            "left" | "left-source" => Ok(SourceHandle::Left),
            "right" | "right-source" => Ok(SourceHandle::Right),
            other => Err(CanvasError::UnknownHandle(other.to_string())),
        }
    }
}

/// Side of the target node an edge arrives at.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetHandle {
    #[default]
    #[serde(rename = "top")]
    Top,
    #[serde(rename = "left-target")]
    Left,
    #[serde(rename = "right-target")]
    Right,
}

impl TargetHandle {
    pub fn id(&self) -> &'static str {
        match self {
            TargetHandle::Top => "top",
            TargetHandle::Left => "left-target",
            TargetHandle::Right => "right-target",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub source_handle: SourceHandle,
    pub target: NodeId,
    pub target_handle: TargetHandle,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        source_handle: SourceHandle,
        target: impl Into<NodeId>,
        target_handle: TargetHandle,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_handle,
            target: target.into(),
            target_handle,
        }
    }

    /// Trunk edge: bottom of the parent to the top of the child.
    pub fn trunk(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self::new(id, source, SourceHandle::Bottom, target, TargetHandle::Top)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
